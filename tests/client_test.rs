use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use futures::StreamExt;
use tgrelay::{
    api::{ForwardMessageRequest, GetUpdatesRequest, SendMessageRequest},
    fake::FakeServer,
    *,
};

#[test]
fn method_urls() {
    let client = Client::new("T".to_string());

    assert_eq!(
        client
            .method_url("sendMessage", &SendMessageRequest::new("123", "hello"))
            .unwrap()
            .as_str(),
        "https://api.telegram.org/botT/sendMessage?chat_id=123&text=hello"
    );
    assert_eq!(
        client
            .method_url("forwardMessage", &ForwardMessageRequest::new("-100", "@dest", 42))
            .unwrap()
            .as_str(),
        "https://api.telegram.org/botT/forwardMessage?chat_id=%40dest&from_chat_id=-100&message_id=42"
    );
    assert_eq!(
        client
            .method_url("getUpdates", &GetUpdatesRequest::new())
            .unwrap()
            .as_str(),
        "https://api.telegram.org/botT/getUpdates"
    );
    assert_eq!(
        client.file_url("documents/file_0.pdf"),
        "https://api.telegram.org/file/botT/documents/file_0.pdf"
    );
}

#[test]
fn only_method_calls_have_a_total_deadline() {
    let timeout = Duration::from_secs(30);
    let client = Client::new("T".to_string()).with_timeout(timeout).unwrap();

    let url = client
        .method_url("sendMessage", &SendMessageRequest::new("123", "hello"))
        .unwrap();
    let method = client.method_request(url).build().unwrap();
    assert_eq!(method.timeout(), Some(&timeout));

    let file = client.file_request("documents/file_0.pdf").build().unwrap();
    assert_eq!(
        file.url().as_str(),
        "https://api.telegram.org/file/botT/documents/file_0.pdf"
    );
    assert_eq!(file.timeout(), None);
}

#[test]
fn text_is_query_encoded() {
    let client = Client::new("T".to_string());
    let url = client
        .method_url("sendMessage", &SendMessageRequest::new("123", "a b&c=d"))
        .unwrap();
    let text = url
        .query_pairs()
        .find(|(k, _)| k == "text")
        .map(|(_, v)| v.into_owned());
    assert_eq!(text.as_deref(), Some("a b&c=d"));
}

#[tokio::test]
async fn get_handler_fn_sees_every_request() {
    let seen = Arc::new(Mutex::new(vec![]));
    let recorder = Arc::clone(&seen);
    let client = Client::new("T".to_string()).with_get_handler_fn(
        move |method: String, url: String| -> Result<String> {
            recorder.lock().unwrap().push((method, url));
            Ok(r#"{"ok":true}"#.to_string())
        },
    );
    let api = API::new(client);

    api.send_message(&SendMessageRequest::new("123", "hello"))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "sendMessage");
    assert_eq!(
        seen[0].1,
        "https://api.telegram.org/botT/sendMessage?chat_id=123&text=hello"
    );
}

#[tokio::test]
async fn unparseable_response_is_an_error() {
    let client = Client::new("T".to_string())
        .with_get_handler_fn(|_: String, _: String| -> Result<String> {
            Ok("<html>Bad Gateway</html>".to_string())
        });
    let err = API::new(client).get_me().await.unwrap_err();
    assert!(format!("{err:#}").contains("Unparseable response to /getMe"));
}

#[tokio::test]
async fn typed_methods_read_their_results() {
    let fakeserver = FakeServer::new();
    fakeserver
        .api
        .set_updates(vec![api::Update {
            update_id: 7,
            message: Some(api::Message::with_document("abc")),
        }])
        .await;
    let api = API::new(Client::new("T".to_string()).with_get_handler(fakeserver.clone()));

    let updates = api.get_updates(&GetUpdatesRequest::new()).await.unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].document().unwrap().file_id, "abc");

    let photos = api
        .get_user_profile_photos(&api::GetUserProfilePhotosRequest::new(42))
        .await
        .unwrap();
    assert_eq!(photos.total_count, 0);
    assert_eq!(
        fakeserver.api.calls_to("getUserProfilePhotos").await[0].query["user_id"],
        "42"
    );

    let raw: serde_json::Value = api
        .call("getMe", &api::GetMeRequest::default())
        .await
        .unwrap();
    assert_eq!(raw["username"], "tgrelay");
}

#[tokio::test]
async fn app_errors_carry_the_description() {
    let fakeserver = FakeServer::new();
    fakeserver
        .api
        .respond_err("deleteMessage", "Bad Request: message to delete not found")
        .await;
    let api = API::new(Client::new("T".to_string()).with_get_handler(fakeserver.clone()));

    let err = api
        .delete_message(&api::DeleteMessageRequest::new("123", 9))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::AppError(d)) if d == "Bad Request: message to delete not found"
    ));
}

#[tokio::test]
async fn downloads_are_streamed_in_chunks() {
    let fakeserver = FakeServer::new();
    let content: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
    fakeserver.api.add_file("abc", content.clone()).await;
    let api = API::new(Client::new("T".to_string()).with_get_handler(fakeserver.clone()));

    let file = api.get_file(&api::GetFileRequest::new("abc")).await.unwrap();
    assert_eq!(file.file_size, Some(2500));

    let chunks: Vec<_> = api
        .client
        .download(file.path().unwrap())
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(chunks.len(), 3);
    let joined: Vec<u8> = chunks
        .into_iter()
        .flat_map(|c| c.unwrap().to_vec())
        .collect();
    assert_eq!(joined, content);
}

#[tokio::test]
async fn download_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("taken");
    std::fs::write(&destination, b"keep me").unwrap();

    let fakeserver = FakeServer::new();
    fakeserver.api.add_file("abc", b"new bytes".to_vec()).await;
    let api = API::new(Client::new("T".to_string()).with_get_handler(fakeserver.clone()));
    let file = api.get_file(&api::GetFileRequest::new("abc")).await.unwrap();

    assert!(api
        .download_file(file.path().unwrap(), &destination)
        .await
        .is_err());
    assert_eq!(std::fs::read(&destination).unwrap(), b"keep me");
}

#[tokio::test]
async fn missing_remote_file_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("never");

    let fakeserver = FakeServer::new();
    let client = Client::new("T".to_string()).with_get_handler(fakeserver.clone());

    assert!(client
        .download_to("documents/nope", &destination)
        .await
        .is_err());
    assert!(!destination.exists());
}
