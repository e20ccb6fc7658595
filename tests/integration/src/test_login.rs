//! Login link integration tests.

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use passlink_auth::LinkOptions;
    use passlink_core::PassLinkConfig;
    use reqwest::StatusCode;

    use crate::{TestServer, client, location, session_cookie, test_config};

    #[tokio::test]
    async fn test_should_log_in_with_fresh_link() {
        let server = TestServer::start().await.unwrap();
        let link = server.link(1, &LinkOptions::default()).unwrap();

        let resp = client()
            .get(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp).as_deref(), Some("/"));
        assert!(session_cookie(&resp).is_some_and(|c| c.starts_with("passlink_session=")));
        assert_eq!(server.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_should_reject_link_without_signature() {
        let server = TestServer::start().await.unwrap();
        let link = server.link(1, &LinkOptions::default()).unwrap();
        let unsigned = format!("{}?expires={}", link.path, link.expires_at().unwrap());

        let resp = client().get(server.url(&unsigned)).send().await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.text().await.unwrap(), "Expired or Invalid Link");
        assert!(server.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_tampered_link() {
        let server = TestServer::start().await.unwrap();
        let link = server.link(1, &LinkOptions::default()).unwrap();
        let forged = link.path_and_query().replace("/magic-login/1?", "/magic-login/2?");

        let resp = client().get(server.url(&forged)).send().await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(session_cookie(&resp).is_none());
    }

    #[tokio::test]
    async fn test_should_reject_expired_link() {
        let server = TestServer::start().await.unwrap();
        let link = server.link(1, &LinkOptions::default()).unwrap();

        server.clock.advance(Duration::minutes(30));
        let at_expiry = client()
            .get(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();
        assert_eq!(at_expiry.status(), StatusCode::FOUND);

        server.clock.advance(Duration::seconds(1));
        let after_expiry = client()
            .get(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();
        assert_eq!(after_expiry.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_should_redirect_to_signed_destination() {
        let server = TestServer::start().await.unwrap();
        let options = LinkOptions::builder().redirect_url("/dashboard").build();
        let link = server.link(2, &options).unwrap();

        let resp = client()
            .get(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp).as_deref(), Some("/dashboard"));
    }

    #[tokio::test]
    async fn test_should_redirect_already_authenticated_visitor() {
        let server = TestServer::start().await.unwrap();
        let http = client();

        let first = server.link(1, &LinkOptions::default()).unwrap();
        let resp = http
            .get(server.url(&first.path_and_query()))
            .send()
            .await
            .unwrap();
        let cookie = session_cookie(&resp).unwrap();

        let second = server.link(1, &LinkOptions::default()).unwrap();
        let resp = http
            .get(server.url(&format!("{}&redirect_to=/happy_path", second.path_and_query())))
            .header(reqwest::header::COOKIE, cookie)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp).as_deref(), Some("/happy_path"));
        assert!(session_cookie(&resp).is_none());
        assert_eq!(server.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_should_serve_links_under_base_path() {
        let config = PassLinkConfig {
            base_path: "/auth".to_owned(),
            default_ttl_minutes: 5,
            ..test_config()
        };
        let server = TestServer::start_with(config).await.unwrap();
        let link = server.link(2, &LinkOptions::default()).unwrap();
        assert!(link.path.starts_with("/auth/magic-login/"));

        let resp = client()
            .get(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);

        let outside = client()
            .get(server.url(&link.path_and_query().replacen("/auth", "", 1)))
            .send()
            .await
            .unwrap();
        assert_eq!(outside.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_should_reject_link_for_unknown_principal() {
        let server = TestServer::start().await.unwrap();
        let link = server.link(99, &LinkOptions::default()).unwrap();

        let resp = client()
            .get(server.url(&link.path_and_query()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
