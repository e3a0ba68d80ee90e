mod common;

use common::*;

#[tokio::test]
async fn test_health() {
    let setup = TestSetup::new();

    let response = setup.send_get_request("/health").await.unwrap();

    assert_eq!(response.status(), 200);
}
