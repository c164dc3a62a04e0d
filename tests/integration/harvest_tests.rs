use channel_harvester::config::{load_config, validate, Config};
use channel_harvester::harvest::harvest;
use channel_harvester::{Coordinator, StopReason};
use std::io::Write;
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message(channel: &str, id: u64, text: &str, photo: Option<&str>) -> String {
    let photo = photo
        .map(|url| {
            format!(
                r#"<a class="tgme_widget_message_photo_wrap" href="https://t.me/{channel}/{id}" style="width:800px;background-image:url('{url}')"></a>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="tgme_widget_message_wrap js-widget_message_wrap">
  <div class="tgme_widget_message js-widget_message" data-post="{channel}/{id}">
    {photo}
    <div class="tgme_widget_message_text js-message_text" dir="auto">{text}</div>
    <a class="tgme_widget_message_date" href="https://t.me/{channel}/{id}"><time datetime="2024-02-{id:02}T08:00:00+00:00" class="time">08:00</time></a>
  </div>
</div>"#
    )
}

fn page(messages: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><body><section class=\"tgme_channel_history\">{}</section></body></html>",
        messages.concat()
    )
}

fn test_config(server: &MockServer, channels: &[&str]) -> Config {
    Config {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        base_url: server.uri(),
        max_retries: 3,
        retry_delay: 0,
        timeout: 5,
        max_empty_pages: 2,
        politeness_delay_ms: 5,
        ..Config::default()
    }
}

/// Mounts a page for `channel`, optionally only for one `before` cursor
async fn mount_page(server: &MockServer, channel: &str, before: Option<&str>, body: String) {
    let mock = Mock::given(method("GET")).and(path(format!("/s/{}", channel)));
    let mock = match before {
        Some(cursor) => mock.and(query_param("before", cursor)),
        None => mock,
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_two_channels() {
    let server = MockServer::start().await;

    // Cursor-specific mocks are mounted first so they win over the newest page
    mount_page(
        &server,
        "alpha",
        Some("3"),
        page(&[
            message("alpha", 1, "first", None),
            message("alpha", 2, "second", None),
        ]),
    )
    .await;
    mount_page(
        &server,
        "alpha",
        None,
        page(&[
            message("alpha", 3, "third", None),
            message("alpha", 4, "fourth &amp; more", Some("https://cdn.example/4.jpg")),
            message("alpha", 5, "fifth", None),
        ]),
    )
    .await;
    mount_page(&server, "beta", Some("10"), page(&[])).await;
    mount_page(
        &server,
        "beta",
        None,
        page(&[
            message("beta", 10, "ten", None),
            message("beta", 11, "eleven", None),
        ]),
    )
    .await;

    let coordinator = Coordinator::new(test_config(&server, &["alpha", "beta"])).unwrap();
    let (_tx, rx) = watch::channel(false);
    let outcome = coordinator.run(rx).await;

    assert_eq!(outcome.records.len(), 7);
    assert!(!outcome.interrupted());

    let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["11", "10", "5", "4", "3", "2", "1"]);

    let fourth = outcome.records.iter().find(|r| r.id == "4").unwrap();
    assert_eq!(fourth.text, "fourth & more");
    assert_eq!(fourth.photo_ref, "https://cdn.example/4.jpg");

    let alpha = &outcome.walks[0];
    assert_eq!(alpha.stop_reason, StopReason::ReachedEarliest);
    assert_eq!(alpha.pages_fetched, 2);
    assert_eq!(alpha.oldest_id, Some(1));
    assert_eq!(alpha.newest_id, Some(5));

    let beta = &outcome.walks[1];
    assert_eq!(beta.stop_reason, StopReason::EmptyPages);
    assert_eq!(beta.pages_fetched, 3);
}

#[tokio::test]
async fn test_retries_transient_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s/alpha"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "alpha", None, page(&[message("alpha", 1, "only", None)])).await;

    let coordinator = Coordinator::new(test_config(&server, &["alpha"])).unwrap();
    let (_tx, rx) = watch::channel(false);
    let outcome = coordinator.run(rx).await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.walks[0].stop_reason, StopReason::ReachedEarliest);
}

#[tokio::test]
async fn test_missing_channel_fails_alone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "alpha", None, page(&[message("alpha", 1, "only", None)])).await;

    let coordinator = Coordinator::new(test_config(&server, &["gone", "alpha"])).unwrap();
    let (_tx, rx) = watch::channel(false);
    let outcome = coordinator.run(rx).await;

    assert_eq!(outcome.walks[0].stop_reason, StopReason::FetchFailed);
    assert_eq!(outcome.walks[0].records, 0);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_start_id_is_first_cursor() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "alpha",
        Some("4"),
        page(&[
            message("alpha", 2, "two", None),
            message("alpha", 3, "three", None),
        ]),
    )
    .await;
    mount_page(&server, "alpha", Some("2"), page(&[message("alpha", 1, "one", None)])).await;
    // The newest page is never requested when a start id is configured
    Mock::given(method("GET"))
        .and(path("/s/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[
            message("alpha", 4, "four", None),
            message("alpha", 5, "five", None),
        ])))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server, &["alpha"]);
    config.start_ids.insert("alpha".to_string(), 4);
    let coordinator = Coordinator::new(config).unwrap();
    let (_tx, rx) = watch::channel(false);
    let outcome = coordinator.run(rx).await;

    assert_eq!(outcome.walks[0].stop_reason, StopReason::ReachedEarliest);
    let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "2", "1"]);
}

#[tokio::test]
async fn test_config_file_to_json_output() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "alpha",
        None,
        page(&[
            message("alpha", 1, "Привет", None),
            message("alpha", 2, "world", Some("https://cdn.example/2.jpg")),
        ]),
    )
    .await;

    let out_dir = tempfile::tempdir().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
channels = ["alpha"]
output_format = "json"
retry_delay = 0
politeness_delay_ms = 5
base_url = "{}"
output_dir = "{}"
"#,
        server.uri(),
        out_dir.path().display()
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    validate(&config).unwrap();

    let coordinator = Coordinator::new(config).unwrap();
    let (_tx, rx) = watch::channel(false);
    let outcome = coordinator.run(rx).await;
    let path = coordinator.deliver(&outcome).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("telegram_posts_"));
    assert!(name.ends_with(".json"));

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("Привет"));
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value[0]["message_id"], "2");
    assert_eq!(value[0]["photo_url"], "https://cdn.example/2.jpg");
    assert_eq!(value[1]["text"], "Привет");
    assert_eq!(value[1]["photo_url"], "");
}

#[tokio::test]
async fn test_harvest_entry_point_honours_cancel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let outcome = harvest(test_config(&server, &["alpha"]), rx).await.unwrap();

    assert!(outcome.interrupted());
    assert!(outcome.records.is_empty());
}
