use std::time::Duration;

use bloodclan_api_client::{PredictionClient, HEALTH_PATH, PREDICT_PATH};
use bloodclan_core::{BloodGroup, PredictError, Predictor, UploadedImage};
use mockito::Matcher;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn fingerprint() -> UploadedImage {
    UploadedImage::new(vec![b'x'; 4096], "image/png").with_file_name("thumb.png")
}

#[tokio::test]
async fn test_predict_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PREDICT_PATH)
        .match_header(
            "content-type",
            Matcher::Regex("multipart/form-data; boundary=.*".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="fingerprint""#.to_string()),
            Matcher::Regex(r#"filename="thumb.png""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "predicted_group": "O-",
                "confidence": 0.92,
                "allowed_to_donate": true,
                "threshold": 0.65,
                "model_accuracy": "99.5%",
                "confidence_percentage": 92.0,
                "message": "Predicted blood group: O- with 92.00% confidence"
            }"#,
        )
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let result = client.predict(&fingerprint()).await.unwrap();

    assert_eq!(result.predicted_group, BloodGroup::ONegative);
    assert_eq!(result.confidence, 0.92);
    assert!(result.allowed_to_donate);
    assert_eq!(result.threshold, 0.65);
    assert_eq!(result.model_accuracy.as_deref(), Some("99.5%"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_predict_through_trait_object() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body(r#"{"predicted_group": "B+", "confidence": 0.5, "allowed_to_donate": false, "threshold": 0.65}"#)
        .create_async()
        .await;

    let predictor: Box<dyn Predictor> = Box::new(PredictionClient::new(server.url()).unwrap());
    let result = predictor.predict(&fingerprint()).await.unwrap();
    assert_eq!(result.predicted_group, BloodGroup::BPositive);
    assert!(!result.allowed_to_donate);
}

#[tokio::test]
async fn test_payload_too_large() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(413)
        .with_body("Request Entity Too Large")
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert_eq!(err, PredictError::PayloadTooLarge("HTTP 413".to_string()));
}

#[tokio::test]
async fn test_payload_too_large_with_truncated_body() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Answer 413 promising more body than is ever sent, then half-close.
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(
                b"HTTP/1.1 413 Payload Too Large\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 200\r\n\
                  Connection: close\r\n\r\n\
                  {\"error\": \"File to",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(5), async {
            while let Ok(n) = socket.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        })
        .await;
    });

    let client = PredictionClient::new(format!("http://{}", addr)).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert_eq!(err, PredictError::PayloadTooLarge("HTTP 413".to_string()));

    server.abort();
}

#[tokio::test]
async fn test_payload_too_large_detail() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(413)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "File too large."}"#)
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert_eq!(err, PredictError::PayloadTooLarge("File too large.".to_string()));
}

#[tokio::test]
async fn test_service_error_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "Invalid file type. Please upload an image."}"#)
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert_eq!(
        err,
        PredictError::ServiceError("Invalid file type. Please upload an image.".to_string())
    );
}

#[tokio::test]
async fn test_non_json_failure_is_unknown() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert_eq!(err, PredictError::Unknown("HTTP 502".to_string()));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body(r#"{"predicted_group": "A+", "confidence": 0.9}"#)
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert!(matches!(err, PredictError::ServiceError(ref m) if m.starts_with("Malformed")));
}

#[tokio::test]
async fn test_unknown_group_label() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body(r#"{"predicted_group": "Unknown", "confidence": 0.0, "allowed_to_donate": false, "threshold": 0.65}"#)
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert!(matches!(err, PredictError::ServiceError(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = PredictionClient::new(format!("http://{}", addr)).unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert!(matches!(err, PredictError::NetworkUnavailable(_)));
    assert!(!client.is_available().await);
}

#[tokio::test]
async fn test_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept connections and hold them open without ever answering.
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = PredictionClient::builder(format!("http://{}", addr))
        .predict_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let err = client.predict(&fingerprint()).await.unwrap_err();
    assert_eq!(err, PredictError::Timeout { timeout_secs: 1 });
    assert!(err.is_timeout());

    server.abort();
}

#[tokio::test]
async fn test_health_available() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", HEALTH_PATH)
        .with_status(200)
        .with_body(r#"{"status": "healthy", "model_loaded": true, "accuracy": "99.5%"}"#)
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let health = client.health().await.unwrap();
    assert!(health.model_loaded);
    assert_eq!(health.http_status, 200);
    assert!(client.is_available().await);
}

#[tokio::test]
async fn test_health_unhealthy() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", HEALTH_PATH)
        .with_status(500)
        .with_body(r#"{"status": "unhealthy", "model_loaded": false, "error": "model file missing"}"#)
        .create_async()
        .await;

    let client = PredictionClient::new(server.url()).unwrap();
    let health = client.health().await.unwrap();
    assert_eq!(health.error.as_deref(), Some("model file missing"));
    assert!(!health.is_healthy());
    assert!(!client.is_available().await);
}
