mod support;

use std::time::Duration;

use pretty_assertions::assert_eq;
use scout_core::{IndicatorSet, Language, Status};
use scout_engine::{ContextId, Task, ANY_ORIGIN};
use support::{
    orchestrator, page, test_settings, FakeRenderer, FakeTransport, Post, RecordingSink, Reply,
};
use tokio::time::Instant;
use url::Url;

fn langs(languages: &[Language]) -> IndicatorSet {
    languages.iter().copied().collect()
}

#[tokio::test(start_paused = true)]
async fn http_error_is_final_without_render() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::silent();
    let address = page("/missing");
    transport.reply(&address, Reply::html(404, "Not Found"));

    let orch = orchestrator(transport.clone(), Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(
        sink.entries(),
        vec![(false, Status::Loading), (true, Status::HttpError(404))]
    );
    assert!(renderer.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn keywords_in_fetched_page_are_final() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::silent();
    let address = page("/t/1");
    transport.reply(&address, Reply::html(200, "<p>Subtitles: French, danish</p>"));

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(
        sink.terminal(),
        vec![Status::Found(langs(&[Language::Danish, Language::French]))]
    );
    assert!(renderer.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn keywordless_page_escalates_to_render() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![Post::Report(
        "<div>English subs</div><div>SWEDISH subs</div>".to_string(),
    )]);
    let address = page("/t/2");
    transport.reply(&address, Reply::html(200, "<div id=app></div>"));

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address.clone(), sink.clone())).await;

    assert_eq!(renderer.opened().len(), 1);
    assert_eq!(renderer.opened()[0].1, address.as_str());
    // Vocabulary order, not text order.
    let found = langs(&[Language::Swedish, Language::English]);
    assert_eq!(sink.terminal(), vec![Status::Found(found)]);
    assert_eq!(sink.terminal()[0].symbol(), "🇸🇪🇬🇧");
}

#[tokio::test(start_paused = true)]
async fn empty_render_result_is_not_found() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![Post::Report("Seeders 3".to_string())]);
    let address = page("/t/3");
    transport.reply(&address, Reply::html(200, "nothing here"));

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::NotFound]);
    assert_eq!(renderer.closed().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn foreign_sender_is_ignored_until_timeout() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![Post::ReportAs(
        ContextId::from_raw(9_999),
        "swedish".to_string(),
    )]);
    let address = page("/t/4");
    transport.reply(&address, Reply::html(200, "nothing here"));

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::TimedOut]);
}

#[tokio::test(start_paused = true)]
async fn mismatched_address_is_ignored_until_timeout() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![
        Post::ReportUrl("https://tracker.test/login".to_string(), "english".to_string()),
        Post::Raw("not json".to_string()),
        Post::WrongOrigin("english".to_string()),
    ]);
    let address = page("/t/5");
    transport.reply(&address, Reply::html(200, "nothing here"));

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::TimedOut]);
}

#[tokio::test(start_paused = true)]
async fn valid_message_after_noise_is_accepted() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![
        Post::ReportAs(ContextId::from_raw(424_242), "german".to_string()),
        Post::Raw(r#"{"flags":"🇩🇪"}"#.to_string()),
        Post::Report("icelandic".to_string()),
    ]);
    let address = page("/t/6");
    transport.reply(&address, Reply::html(200, "nothing here"));

    let orch = orchestrator(transport, Some(renderer), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(
        sink.terminal(),
        vec![Status::Found(langs(&[Language::Icelandic]))]
    );
}

#[tokio::test(start_paused = true)]
async fn render_timeout_disposes_context() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::silent();
    let address = page("/t/7");
    transport.reply(&address, Reply::html(200, "nothing here"));

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address.clone(), sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::TimedOut]);
    let opened = renderer.opened();
    assert_eq!(renderer.closed(), vec![opened[0].0]);

    // Nobody listens for the disposed context any more.
    let port = renderer.last_port().unwrap();
    let late = format!(r#"{{"url":"{}","flags":""}}"#, address.as_str());
    assert!(!port.post(opened[0].0, ANY_ORIGIN, late));
}

#[tokio::test(start_paused = true)]
async fn disallowed_host_is_blocked_without_network() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::silent();
    let orch = orchestrator(transport.clone(), Some(renderer.clone()), test_settings());

    for address in [
        "https://observed-only.test/x",
        "https://contact-only.test/x",
        "http://radarr.intra/movie/1",
        "data:text/html,swedish",
    ] {
        let sink = RecordingSink::default();
        let started = Instant::now();
        orch.resolve(Task::new(Url::parse(address).unwrap(), sink.clone()))
            .await;
        assert_eq!(sink.entries(), vec![(true, Status::Blocked)], "{address}");
        // No attempt, so no throttling delay either.
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
    assert!(transport.calls().is_empty());
    assert!(renderer.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn network_error_is_blocked_and_not_escalated() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![Post::Report("english".to_string())]);
    let address = page("/t/8");
    transport.reply(&address, Reply::NetworkError);

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::Blocked]);
    assert!(renderer.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn network_error_escalates_when_enabled() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![Post::Report("english".to_string())]);
    let address = page("/t/9");
    transport.reply(&address, Reply::NetworkError);

    let mut settings = test_settings();
    settings.escalate_on_network_error = true;
    let orch = orchestrator(transport, Some(renderer.clone()), settings);
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(
        sink.terminal(),
        vec![Status::Found(langs(&[Language::English]))]
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_fetch_times_out() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::silent();
    let address = page("/t/slow");
    transport.reply(&address, Reply::Hang);

    let orch = orchestrator(transport, Some(renderer.clone()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::TimedOut]);
    assert!(renderer.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn undecodable_body_is_unsupported() {
    let transport = FakeTransport::new();
    let address = page("/t/poster.png");
    transport.reply(
        &address,
        Reply::Page {
            status: 200,
            content_type: Some("image/png".to_string()),
            body: vec![0x89, b'P', b'N', b'G'],
        },
    );

    let orch = orchestrator(transport, Some(FakeRenderer::silent()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::Unsupported]);
}

#[tokio::test(start_paused = true)]
async fn renderer_failure_blocks() {
    let transport = FakeTransport::new();
    let address = page("/t/10");
    transport.reply(&address, Reply::html(200, "nothing"));

    let orch = orchestrator(transport, Some(FakeRenderer::failing()), test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::Blocked]);
}

#[tokio::test(start_paused = true)]
async fn without_renderer_inconclusive_is_not_found() {
    let transport = FakeTransport::new();
    let address = page("/t/11");
    transport.reply(&address, Reply::html(200, "nothing"));

    let orch = orchestrator(transport, None, test_settings());
    let sink = RecordingSink::default();
    orch.resolve(Task::new(address, sink.clone())).await;

    assert_eq!(sink.terminal(), vec![Status::NotFound]);
}

#[tokio::test(start_paused = true)]
async fn inter_attempt_delay_is_observed() {
    let transport = FakeTransport::new();
    let renderer = FakeRenderer::posting(vec![Post::Report("finnish".to_string())]);
    let direct = page("/direct");
    let escalated = page("/escalated");
    transport.reply(&direct, Reply::html(200, "norwegian"));
    transport.reply(&escalated, Reply::html(200, "nothing"));
    let orch = orchestrator(transport, Some(renderer), test_settings());

    let started = Instant::now();
    orch.resolve(Task::new(direct, RecordingSink::default())).await;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1_000) && elapsed < Duration::from_millis(1_100));

    let started = Instant::now();
    orch.resolve(Task::new(escalated, RecordingSink::default()))
        .await;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2_000) && elapsed < Duration::from_millis(2_100));
}
