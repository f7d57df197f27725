use mailjet_mailer::format::MessageArgs;
use mailjet_mailer::{
    offline, Config, Delivered, Delivery, MailContext, MailerDefaults, MessageMailer,
    TemplateMailer,
};

// Everything touching the process-wide capture list lives in one test so
// parallel test threads cannot interleave appends and clears.
#[tokio::test]
async fn offline_mode_records_deliveries_in_call_order() {
    offline::clear();

    let ctx = MailContext::offline(Config::default());
    let defaults = MailerDefaults::builder().from("support@example.com").build();

    // Two message-mode sends on two different mailer instances.
    let mut first = MessageMailer::new(ctx.clone()).with_defaults(defaults.clone());
    first
        .build(
            MessageArgs::builder()
                .to("one@example.com")
                .subject("First")
                .build(),
        )
        .unwrap();
    let outcome = first.deliver_now().await.unwrap();

    // The capture comes back to the caller as well as landing on the list.
    let Delivered::Captured(capture) = outcome else {
        panic!("expected a captured delivery");
    };
    assert_eq!(capture.message, first.message);
    assert_eq!(capture.template_name, None);

    let mut second = MessageMailer::new(ctx.clone()).with_defaults(defaults.clone());
    second
        .build(
            MessageArgs::builder()
                .to("two@example.com")
                .subject("Second")
                .build(),
        )
        .unwrap();
    second.deliver_now().await.unwrap();

    let sent = offline::deliveries();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0].message.as_ref().unwrap().subject.as_deref(),
        Some("First")
    );
    assert_eq!(
        sent[1].message.as_ref().unwrap().subject.as_deref(),
        Some("Second")
    );

    // deliver_later records instead of enqueueing.
    first.deliver_later().await.unwrap();
    assert_eq!(offline::deliveries().len(), 3);

    // Template-mode captures carry the template fields.
    let mut templated = TemplateMailer::new(ctx).with_defaults(defaults);
    templated
        .build(
            MessageArgs::builder()
                .to("three@example.com")
                .template("welcome")
                .build(),
        )
        .unwrap();
    templated.deliver_now().await.unwrap();
    templated.deliver_later().await.unwrap();

    let sent = offline::deliveries();
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[3].template_name.as_deref(), Some("welcome"));
    assert_eq!(sent[4].template_name.as_deref(), Some("welcome"));
    assert!(sent[3].template_content.is_some());

    // Clearing empties the list for the next test case.
    offline::clear();
    assert!(offline::deliveries().is_empty());
}
