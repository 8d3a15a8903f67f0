//! Integration tests for building and sending requests through a mocked transport.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wh_client::{ApiClient, ApiRequest, ApiResponse, HttpTransport};
use wh_core::{Configuration, Error, ParamValue, QueryParamStyle};

mock! {
    Transport {}

    #[async_trait]
    impl HttpTransport for Transport {
        async fn execute(&self, request: ApiRequest) -> wh_core::Result<ApiResponse>;
    }
}

#[derive(Serialize)]
struct Pageable {
    page: u32,
    size: u32,
    sort: Vec<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct PrinterDto {
    id: u64,
    name: String,
}

/// Mirrors a generated `GET /api/printer` operation.
async fn get_printers(client: &ApiClient, pageable: Option<&Pageable>) -> wh_core::Result<Vec<PrinterDto>> {
    let pageable = ApiClient::require(pageable, "pageable", "getPrinters")?;

    let mut query = client.query();
    client.add_to_params(
        &mut query,
        "pageable",
        &ParamValue::from_serialize(pageable)?,
        QueryParamStyle::Form,
        true,
    )?;

    let request = client
        .request(Method::GET, "/api/printer")
        .bearer_auth()
        .query(query)
        .accept(&["*/*"])
        .build()?;
    client.send_json(request).await
}

fn configuration() -> Configuration {
    Configuration::new("https://wh.example.com")
        .unwrap()
        .with_access_token_provider(|| Some("live-token".to_string()))
}

#[tokio::test]
async fn test_get_printers_sends_form_exploded_pageable() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .withf(|request| {
            request.method == Method::GET
                && request.url.as_str()
                    == "https://wh.example.com/api/printer?page=0&size=20&sort=name%2Casc"
                && request.header("authorization") == Some("Bearer live-token")
        })
        .times(1)
        .returning(|_| Ok(ApiResponse::ok_json(&json!([{"id": 1, "name": "Zebra ZT410"}]))));

    let client = ApiClient::new(configuration(), Arc::new(transport));
    let pageable = Pageable {
        page: 0,
        size: 20,
        sort: vec!["name,asc".to_string()],
    };

    let printers = get_printers(&client, Some(&pageable)).await.unwrap();
    assert_eq!(
        printers,
        vec![PrinterDto {
            id: 1,
            name: "Zebra ZT410".to_string()
        }]
    );
}

#[tokio::test]
async fn test_missing_required_parameter_never_reaches_transport() {
    let mut transport = MockTransport::new();
    transport.expect_execute().times(0);

    let client = ApiClient::new(configuration(), Arc::new(transport));
    let err = get_printers(&client, None).await.unwrap_err();

    assert!(err.is_usage_error());
    assert!(matches!(err, Error::MissingParameter { .. }));
}

#[tokio::test]
async fn test_deep_object_misuse_never_reaches_transport() {
    let mut transport = MockTransport::new();
    transport.expect_execute().times(0);

    let client = ApiClient::new(configuration(), Arc::new(transport));
    let mut query = client.query();
    let err = client
        .add_to_params(
            &mut query,
            "filter",
            &ParamValue::from("status=READY"),
            QueryParamStyle::DeepObject,
            true,
        )
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "An object must be provided for key filter as it is a deep object"
    );
}

#[tokio::test]
async fn test_server_error_is_mapped() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .returning(|_| Ok(ApiResponse::new(StatusCode::SERVICE_UNAVAILABLE, "maintenance")));

    let client = ApiClient::new(configuration(), Arc::new(transport));
    let request = client.request(Method::GET, "/api/tenants").build().unwrap();

    let err = client.send_empty(request).await.unwrap_err();
    assert_eq!(err, Error::ServiceUnavailable("maintenance".to_string()));
}
