use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mailjet_mailer::format::{FormattedMessage, MessageArgs, Pair};
use mailjet_mailer::queue::{perform_entry, Job, MemoryQueue};
use mailjet_mailer::{
    Config, Delivered, DeliverMessageJob, Delivery, Error, MailContext, MailerDefaults,
    MessageMailer, MessagesApi, TemplateMailer,
};
use time::macros::datetime;

/// Records every provider call for assertions.
#[derive(Default)]
struct MockApi {
    created: Mutex<Vec<FormattedMessage>>,
    templated: Mutex<Vec<(String, Vec<Pair>, FormattedMessage, bool, Option<String>)>>,
}

#[async_trait]
impl MessagesApi for MockApi {
    async fn create(&self, message: &FormattedMessage) -> Result<(), Error> {
        self.created.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn send_template(
        &self,
        template_name: &str,
        template_content: &[Pair],
        message: &FormattedMessage,
        deferred: bool,
        send_at: Option<&str>,
    ) -> Result<(), Error> {
        self.templated.lock().unwrap().push((
            template_name.to_string(),
            template_content.to_vec(),
            message.clone(),
            deferred,
            send_at.map(str::to_string),
        ));
        Ok(())
    }
}

fn live_ctx() -> (MailContext, Arc<MockApi>, MemoryQueue) {
    let api = Arc::new(MockApi::default());
    let queue = MemoryQueue::new();
    let ctx = MailContext::new(Config::default(), api.clone(), Arc::new(queue.clone()));
    (ctx, api, queue)
}

fn built_mailer(ctx: MailContext) -> MessageMailer {
    let mut mailer = MessageMailer::new(ctx)
        .with_defaults(MailerDefaults::builder().from("support@example.com").build());
    mailer
        .build(
            MessageArgs::builder()
                .to("user@example.com")
                .subject("Hello")
                .text("Hi there")
                .build(),
        )
        .unwrap();
    mailer
}

#[tokio::test]
async fn deliver_now_dispatches_the_built_message() {
    let (ctx, api, _queue) = live_ctx();
    let mailer = built_mailer(ctx);

    let outcome = mailer.deliver_now().await.unwrap();
    assert!(matches!(outcome, Delivered::Sent));

    let created = api.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(*mailer.message.as_ref().unwrap(), created[0]);
}

#[tokio::test]
async fn deliver_is_an_alias_for_deliver_now() {
    let (ctx, api, _queue) = live_ctx();
    let mailer = built_mailer(ctx);

    mailer.deliver().await.unwrap();
    assert_eq!(api.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn deliver_now_without_build_is_an_error() {
    let (ctx, _api, _queue) = live_ctx();
    let mailer = MessageMailer::new(ctx);

    let err = mailer.deliver_now().await.unwrap_err();
    assert!(matches!(err, Error::MissingMessage));
}

#[tokio::test]
async fn deliver_later_enqueues_one_job_and_the_worker_side_delivers_it() {
    let (ctx, api, queue) = live_ctx();
    let mut mailer = MessageMailer::new(ctx.clone());
    mailer
        .build(
            MessageArgs::builder()
                .to("user@example.com")
                .subject("Later")
                .deferred(true)
                .send_at(datetime!(2026-03-01 12:30:00 UTC))
                .build(),
        )
        .unwrap();

    let outcome = mailer.deliver_later().await.unwrap();
    let Delivered::Enqueued { job_id } = outcome else {
        panic!("expected an enqueued delivery");
    };

    assert_eq!(queue.len().await, 1);
    let entry = queue.take().await.unwrap();
    assert_eq!(entry.id, job_id);
    assert_eq!(entry.queue, "default");
    assert_eq!(entry.job_type, "mailer::deliver_message");

    // The payload is exactly {message, deferred, send_at, mailer}.
    let job: DeliverMessageJob = serde_json::from_value(entry.payload.clone()).unwrap();
    assert_eq!(job.message, *mailer.message.as_ref().unwrap());
    assert!(job.deferred);
    assert_eq!(job.send_at.as_deref(), Some("2026-03-01 12:30:00"));
    assert_eq!(job.mailer, "MessageMailer");

    // Nothing has reached the provider yet.
    assert!(api.created.lock().unwrap().is_empty());

    // Worker side: replaying the entry closes the loop with one create call.
    perform_entry::<DeliverMessageJob>(&entry, &ctx).await.unwrap();
    let created = api.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0], *mailer.message.as_ref().unwrap());
}

#[tokio::test]
async fn deliver_later_uses_the_configured_queue_name() {
    let api = Arc::new(MockApi::default());
    let queue = MemoryQueue::new();
    let mut config = Config::default();
    config.deliver_later_queue_name = "mailers".to_string();
    let ctx = MailContext::new(config, api, Arc::new(queue.clone()));

    built_mailer(ctx).deliver_later().await.unwrap();

    assert_eq!(queue.take().await.unwrap().queue, "mailers");
}

#[tokio::test]
async fn deferred_job_with_unknown_mailer_fails() {
    let (ctx, _api, _queue) = live_ctx();
    let mailer = built_mailer(ctx.clone());

    let job = DeliverMessageJob {
        message: mailer.message.clone().unwrap(),
        deferred: false,
        send_at: None,
        mailer: "NightlyDigestMailer".to_string(),
    };

    let err = job.perform(&ctx).await.unwrap_err();
    match err {
        Error::UnknownMailer(name) => assert_eq!(name, "NightlyDigestMailer"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn template_deliver_sends_name_content_and_message() {
    let (ctx, api, _queue) = live_ctx();
    let mut mailer = TemplateMailer::new(ctx);
    mailer
        .build(
            MessageArgs::builder()
                .to("user@example.com")
                .template("group-invite")
                .deferred(true)
                .send_at(datetime!(2026-04-01 00:00:00 UTC))
                .build(),
        )
        .unwrap();

    mailer.deliver().await.unwrap();

    let templated = api.templated.lock().unwrap();
    assert_eq!(templated.len(), 1);
    let (name, content, message, deferred, send_at) = &templated[0];
    assert_eq!(name, "group-invite");
    assert_eq!(content, &vec![Pair::new("blank", "")]);
    assert_eq!(message, mailer.message.as_ref().unwrap());
    assert!(*deferred);
    assert_eq!(send_at.as_deref(), Some("2026-04-01 00:00:00"));
}

#[tokio::test]
async fn template_explicit_content_blocks_are_sent_as_pairs() {
    let (ctx, api, _queue) = live_ctx();
    let mut content = serde_json::Map::new();
    content.insert("header".to_string(), "My email content".into());

    let mut mailer = TemplateMailer::new(ctx);
    mailer
        .build(
            MessageArgs::builder()
                .to("user@example.com")
                .template("group-invite")
                .template_content(content)
                .build(),
        )
        .unwrap();
    mailer.deliver_now().await.unwrap();

    let templated = api.templated.lock().unwrap();
    assert_eq!(
        templated[0].1,
        vec![Pair::new("header", "My email content")]
    );
}

#[tokio::test]
async fn template_deliver_without_template_name_is_an_error() {
    let (ctx, _api, _queue) = live_ctx();
    let mut mailer = TemplateMailer::new(ctx);
    mailer
        .build(MessageArgs::builder().to("user@example.com").build())
        .unwrap();

    let err = mailer.deliver_now().await.unwrap_err();
    assert!(matches!(err, Error::MissingTemplate));
}

#[tokio::test]
async fn template_deliver_later_is_not_implemented_in_live_mode() {
    let (ctx, _api, _queue) = live_ctx();
    let mut mailer = TemplateMailer::new(ctx);
    mailer
        .build(
            MessageArgs::builder()
                .to("user@example.com")
                .template("group-invite")
                .build(),
        )
        .unwrap();

    let err = mailer.deliver_later().await.unwrap_err();
    assert!(matches!(err, Error::NotImplemented("deliver_later")));
}
