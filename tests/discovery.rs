//! Target discovery against a mocked archive listing

mod support;

use sst_fetcher::app::{ArchiveClient, TargetDiscovery};
use sst_fetcher::errors::DiscoveryError;
use support::{index_page, test_client_config, FILE_2019_A, FILE_2019_B, FILE_2020_A};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

fn archive_root(server: &MockServer) -> Url {
    Url::parse(&format!("{}/access/", server.uri())).unwrap()
}

fn client_for(base: &Url) -> ArchiveClient {
    ArchiveClient::new(base.clone(), test_client_config()).unwrap()
}

#[tokio::test]
async fn discovers_years_and_filters_misplaced_files() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/access/",
        index_page(&["../", "?C=M;O=A", "2020/", "2019/", "readme.txt", "2019/"]),
    )
    .await;
    mount_page(
        &server,
        "/access/2019/",
        index_page(&["../", FILE_2019_B, FILE_2020_A, "checksums.md5", FILE_2019_A]),
    )
    .await;
    mount_page(&server, "/access/2020/", index_page(&["../", "notes.html"])).await;

    let base = archive_root(&server);
    let client = client_for(&base);
    let targets = TargetDiscovery::new(&client).discover(&base).await.unwrap();

    assert_eq!(targets.years().collect::<Vec<_>>(), vec![2019, 2020]);

    let names: Vec<String> = targets
        .get(2019)
        .unwrap()
        .iter()
        .map(|url| url.path_segments().unwrap().last().unwrap().to_string())
        .collect();
    assert_eq!(names, vec![FILE_2019_A, FILE_2019_B]);
    assert_eq!(
        targets.get(2019).unwrap()[0].as_str(),
        format!("{}2019/{}", base, FILE_2019_A)
    );

    assert!(targets.get(2020).unwrap().is_empty());
    assert_eq!(targets.file_count(), 2);
}

#[tokio::test]
async fn root_listing_without_years_yields_empty_map() {
    let server = MockServer::start().await;
    mount_page(&server, "/access/", index_page(&["../", "about/"])).await;

    let base = archive_root(&server);
    let client = client_for(&base);
    let targets = TargetDiscovery::new(&client).discover(&base).await.unwrap();

    assert!(targets.is_empty());
}

#[tokio::test]
async fn root_server_error_aborts_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/access/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let base = archive_root(&server);
    let client = client_for(&base);
    let err = TargetDiscovery::new(&client)
        .discover(&base)
        .await
        .unwrap_err();

    match err {
        DiscoveryError::Fetch { url, .. } => assert_eq!(url, base.to_string()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_year_page_aborts_without_partial_map() {
    let server = MockServer::start().await;
    mount_page(&server, "/access/", index_page(&["2019/", "2020/"])).await;
    mount_page(&server, "/access/2019/", index_page(&[FILE_2019_A])).await;
    // 2020 is not mounted, so wiremock answers 404

    let base = archive_root(&server);
    let client = client_for(&base);
    let err = TargetDiscovery::new(&client)
        .discover(&base)
        .await
        .unwrap_err();

    match err {
        DiscoveryError::Fetch { url, source } => {
            assert_eq!(url, format!("{}2020/", base));
            assert!(source.to_string().contains("Not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
