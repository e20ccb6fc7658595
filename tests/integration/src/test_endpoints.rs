//! Health, session, and routing integration tests.

#[cfg(test)]
mod tests {
    use passlink_auth::LinkOptions;
    use reqwest::StatusCode;

    use crate::{TestServer, client, session_cookie};

    #[tokio::test]
    async fn test_should_report_health() {
        let server = TestServer::start().await.unwrap();

        let resp = client()
            .get(server.url("/_passlink/health"))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_should_expose_session_principal() {
        let server = TestServer::start().await.unwrap();
        let http = client();
        let link = server.link(2, &LinkOptions::default()).unwrap();

        let login = http
            .get(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();
        let cookie = session_cookie(&login).unwrap();

        let body: serde_json::Value = http
            .get(server.url("/_passlink/session"))
            .header(reqwest::header::COOKIE, cookie)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["principal"], "2");
    }

    #[tokio::test]
    async fn test_should_return_404_for_unknown_paths() {
        let server = TestServer::start().await.unwrap();
        let resp = client().get(server.url("/nowhere")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_should_return_405_for_post_to_login_route() {
        let server = TestServer::start().await.unwrap();
        let link = server.link(1, &LinkOptions::default()).unwrap();

        let resp = client()
            .post(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(server.sessions.is_empty());
    }
}
