use mailjet_mailer::format::MessageArgs;
use mailjet_mailer::{Config, MailContext, MailerDefaults, MessageMailer};

#[test]
fn config_loads_from_environment() {
    std::env::set_var("MAILER_API_KEY", "1237861278");
    std::env::set_var("MAILER_SECRET_KEY", "87654321");
    std::env::set_var("MAILER_DELIVER_LATER_QUEUE_NAME", "mailers");

    let config = Config::from_env().unwrap();

    assert_eq!(config.api_key.as_deref(), Some("1237861278"));
    assert_eq!(config.secret_key.as_deref(), Some("87654321"));
    assert_eq!(config.deliver_later_queue_name, "mailers");

    std::env::remove_var("MAILER_API_KEY");
    std::env::remove_var("MAILER_SECRET_KEY");
    std::env::remove_var("MAILER_DELIVER_LATER_QUEUE_NAME");
}

#[test]
fn config_defaults() {
    let config = Config::default();

    assert_eq!(config.api_key, None);
    assert_eq!(config.deliver_later_queue_name, "default");
    assert_eq!(config.default_url_options.host, "localhost");
    assert_eq!(config.default_url_options.protocol, "https");
}

#[test]
fn interceptor_is_shared_across_config_clones() {
    let config = Config::default();
    let clone = config.clone();

    clone.set_interceptor(|message| {
        message.subject = Some("intercepted".to_string());
    });

    let ctx = MailContext::offline(config);
    let mut mailer = MessageMailer::new(ctx)
        .with_defaults(MailerDefaults::builder().from("a@b.com").build());
    mailer
        .build(MessageArgs::builder().to("user@example.com").build())
        .unwrap();

    assert_eq!(
        mailer.message.as_ref().unwrap().subject.as_deref(),
        Some("intercepted")
    );
}

#[test]
fn debug_output_redacts_credentials() {
    let mut config = Config::default();
    config.api_key = Some("super-secret".to_string());

    let rendered = format!("{config:?}");
    assert!(!rendered.contains("super-secret"));
}
