use std::num::NonZeroU64;

use request_interop::{
    Body, ConstructionErrorKind, Factory, FactoryConfig, Field, FileEntry, Method, RawValue,
    RequestParts, Resource, Stream, StreamError, Upload, UploadError, UploadNode, UploadParts,
    UploadStatus, Url, UrlParts, Whence,
};
use request_interop_test_suite::{
    Sandbox, browser_headers, cgi_server, file_group, file_item, init_logging,
};

#[test]
fn test_url_renders_and_reparses() {
    init_logging();
    let factory = Factory::new();
    let cases = [
        UrlParts::new()
            .scheme("https")
            .host("example.com")
            .port(443)
            .path("/a"),
        UrlParts::new()
            .scheme("http")
            .user("alice")
            .pass("s3cret")
            .host("[::1]")
            .port(8080)
            .path("/x/y")
            .query("q=1&r=2")
            .fragment("top"),
        UrlParts::new().host("example.org"),
        UrlParts::new().path("/only/path").query("a=b"),
        UrlParts::new().path("relative/path"),
        UrlParts::new().fragment("frag"),
    ];
    for parts in cases {
        let url = factory.new_url(parts).unwrap();
        let rendered = url.to_string();
        let reparsed = factory.parse_url(&rendered).unwrap();
        assert_eq!(reparsed, url, "{rendered}");
    }

    let url = factory
        .new_url(
            UrlParts::new()
                .scheme("https")
                .host("example.com")
                .port(443)
                .path("/a"),
        )
        .unwrap();
    assert_eq!(url.to_string(), "https://example.com:443/a");
    assert_eq!(url.user(), None);
    assert_eq!(url.query(), None);
}

#[test]
fn test_url_rejects_empty_components() {
    let factory = Factory::new();
    let err = factory
        .new_url(UrlParts::new().host("example.com").path(""))
        .unwrap_err();
    assert_eq!(err.field, Field::Url);
    assert_eq!(err.kind, ConstructionErrorKind::EmptyComponent("path"));

    for port in [0, -1, 65536] {
        let err = factory
            .new_url(UrlParts::new().host("example.com").port(port))
            .unwrap_err();
        assert_eq!(err.kind, ConstructionErrorKind::PortOutOfRange(port));
    }
    assert_eq!(Url::default().to_string(), "");
}

#[test]
fn test_upload_status_range() {
    let factory = Factory::new();
    for code in 0..=8 {
        let upload = factory.new_upload(UploadParts::new("/tmp/x", code)).unwrap();
        assert_eq!(i64::from(upload.error().code()), code);
    }
    for code in [-1, 9, i64::MAX] {
        let err = factory
            .new_upload(UploadParts::new("/tmp/x", code))
            .unwrap_err();
        assert_eq!(err.field, Field::Upload);
        assert_eq!(err.kind, ConstructionErrorKind::InvalidUploadStatus(code));
    }
}

#[test]
fn test_method_is_stored_uppercase() {
    let factory = Factory::new();
    for method in Method::ALL {
        for raw in [
            method.as_str().to_string(),
            method.as_str().to_ascii_lowercase(),
        ] {
            let req = factory.new_request(RequestParts::new().method(raw)).unwrap();
            assert_eq!(req.method(), method);
            assert_eq!(req.method().to_string(), method.as_str());
        }
    }
    for raw in ["PROPFIND", "GETS", " GET", "get\n"] {
        let err = factory
            .new_request(RequestParts::new().method(raw))
            .unwrap_err();
        assert_eq!(err.field, Field::Method);
    }
}

#[test]
fn test_stream_seek_and_tell() {
    let sandbox = Sandbox::new().unwrap();
    let tmp = sandbox.write("php-abc", b"0123456789").unwrap();
    let upload = Factory::new()
        .new_upload(UploadParts::new(tmp.to_string_lossy(), 0))
        .unwrap();

    let mut stream = upload.stream().unwrap();
    for n in 0..=10 {
        assert_eq!(stream.seek(n, Whence::Start).unwrap(), n as u64);
        assert_eq!(stream.tell().unwrap(), n as u64);
    }
    assert!(stream.eof());

    stream.seek(2, Whence::Start).unwrap();
    assert!(matches!(
        stream.seek(-3, Whence::Current),
        Err(StreamError::NegativeOffset)
    ));
    assert_eq!(stream.tell().unwrap(), 2);
    assert!(matches!(
        stream.seek(-11, Whence::End),
        Err(StreamError::NegativeOffset)
    ));
    assert!(matches!(stream.read(0), Err(StreamError::InvalidLength)));

    assert_eq!(&stream.read(3).unwrap()[..], b"234");
    assert_eq!(stream.read_remaining().unwrap(), "56789");
    assert!(stream.eof());
    assert!(matches!(stream.read(1), Err(StreamError::Eof(10))));
}

#[test]
fn test_upload_moves_once() {
    init_logging();
    let sandbox = Sandbox::new().unwrap();
    let tmp = sandbox.write("php-x", &[7; 1024]).unwrap();
    let upload = Factory::new()
        .new_upload(
            UploadParts::new(tmp.to_string_lossy(), 0)
                .name("photo.png")
                .size(1024),
        )
        .unwrap();

    let dest = sandbox.join("photo.png");
    upload.move_to(&dest).unwrap();
    assert_eq!(sandbox.read("photo.png").unwrap().len(), 1024);
    assert!(!tmp.exists());

    assert!(matches!(
        upload.move_to(&sandbox.join("again.png")),
        Err(UploadError::AlreadyMoved)
    ));
    assert!(matches!(upload.stream(), Err(StreamError::Moved(_))));
}

#[test]
fn test_second_move_fails_after_failed_first() {
    let sandbox = Sandbox::new().unwrap();
    let upload = Factory::new()
        .new_upload(UploadParts::new(sandbox.join("never-written").to_string_lossy(), 0))
        .unwrap();
    assert!(matches!(
        upload.move_to(&sandbox.join("a")),
        Err(UploadError::MissingSource(_))
    ));
    assert!(matches!(
        upload.move_to(&sandbox.join("b")),
        Err(UploadError::AlreadyMoved)
    ));
}

#[test]
fn test_failed_upload_cannot_move() {
    let sandbox = Sandbox::new().unwrap();
    let tmp = sandbox.write("php-partial", b"half").unwrap();
    let upload = Factory::new()
        .new_upload(UploadParts::new(tmp.to_string_lossy(), 3))
        .unwrap();
    assert_eq!(upload.error(), UploadStatus::PARTIAL);
    assert!(matches!(
        upload.move_to(&sandbox.join("out")),
        Err(UploadError::Status(UploadStatus::PARTIAL))
    ));
    assert_eq!(sandbox.read("php-partial").unwrap(), b"half");
}

#[test]
fn test_empty_request() {
    let req = Factory::new().new_request(RequestParts::new()).unwrap();
    assert_eq!(req.method(), Method::GET);
    assert!(req.cookies().is_empty());
    assert!(req.headers().is_empty());
    assert!(req.query().is_empty());
    assert!(req.input().is_empty());
    assert!(req.server().is_empty());
    assert!(req.files().is_empty());
    assert!(req.uploads().is_empty());
    assert!(req.url().is_empty());
    assert_eq!(req.contents().unwrap(), "");
}

#[test]
fn test_full_request() {
    init_logging();
    let sandbox = Sandbox::new().unwrap();
    let avatar = sandbox.write("php-1", b"png").unwrap();
    let doc = sandbox.write("php-2", b"pdf").unwrap();
    let avatar = avatar.to_string_lossy().into_owned();
    let doc = doc.to_string_lossy().into_owned();

    let factory = Factory::new();
    let url = factory
        .parse_url("https://example.com/upload?album=1")
        .unwrap();
    let query = factory.parse_query(url.query().unwrap_or_default());
    let files = RawValue::map([
        ("avatar", file_item(&avatar, "me.png", "image/png", 3)),
        ("docs", file_group(&[(doc.as_str(), "cv.pdf", 3), ("", "", 0)])),
    ]);

    let probe = factory
        .new_request(RequestParts::new().files(files.clone()))
        .unwrap();
    let uploads = factory.uploads_from_files(probe.files());

    let input: RawValue = serde_json::json!({
        "title": "Holiday",
        "tags": ["sea", "sun"],
        "meta": { "public": true, "rating": 4.5, "note": null }
    })
    .into();

    let req = factory
        .new_request(
            RequestParts::new()
                .method("post")
                .url(url)
                .headers(browser_headers())
                .cookie("session", "abc")
                .server(cgi_server())
                .query(RawValue::Null)
                .input(input)
                .files(files)
                .uploads(uploads)
                .body(Resource::from("title=Holiday")),
        )
        .unwrap();

    assert_eq!(req.method(), Method::POST);
    assert_eq!(req.url().host(), Some("example.com"));
    assert_eq!(req.header("user-agent"), Some("Mozilla/5.0"));
    assert!(req.headers().iter().all(|(name, _)| *name == name.to_ascii_lowercase()));
    assert_eq!(req.cookie("session"), Some("abc"));
    assert_eq!(req.server_var("REMOTE_ADDR"), Some("127.0.0.1"));
    assert!(req.query().is_empty());
    assert_eq!(
        query.get("album").and_then(|v| v.as_str()),
        Some("1")
    );

    let tags = req.input().get("tags").unwrap();
    assert_eq!(tags.get("1").and_then(|v| v.as_str()), Some("sun"));
    let meta = req.input().get("meta").unwrap();
    assert!(meta.get("note").unwrap().is_null());

    let Some(FileEntry::Group(group)) = req.files().get("docs") else {
        panic!("docs should be a group");
    };
    assert_eq!(group.items().len(), 2);
    assert_eq!(req.files().get("docs").unwrap().items()[1].1.error, UploadStatus::NO_FILE);

    let avatar = req
        .uploads()
        .get("avatar")
        .and_then(UploadNode::as_upload)
        .unwrap();
    assert_eq!(avatar.media_type(), Some("image/png"));
    assert_eq!(avatar.size(), NonZeroU64::new(3));
    assert_eq!(avatar.stream().unwrap().read_remaining().unwrap(), "png");

    let docs = req.uploads().get("docs").unwrap();
    assert_eq!(docs.uploads().len(), 1);

    assert_eq!(req.contents().unwrap(), "title=Holiday");
    assert_eq!(req.contents().unwrap(), "title=Holiday");
}

#[test]
fn test_files_shape_errors_carry_paths() {
    let factory = Factory::new();
    let files = RawValue::map([(
        "docs",
        RawValue::map([
            ("tmp_name", RawValue::List(vec!["/tmp/a".into(), "/tmp/b".into()])),
            ("error", RawValue::List(vec![RawValue::Int(0)])),
        ]),
    )]);
    let err = factory
        .new_request(RequestParts::new().files(files))
        .unwrap_err();
    assert_eq!(err.field, Field::Files);
    assert_eq!(err.kind, ConstructionErrorKind::ShapeMismatch("error"));
    assert_eq!(err.path.unwrap().to_string(), "docs");

    let err = factory
        .new_request(RequestParts::new().files(RawValue::map([(
            "avatar",
            RawValue::map([("error", RawValue::Int(0))]),
        )])))
        .unwrap_err();
    assert_eq!(err.kind, ConstructionErrorKind::MissingKey("tmp_name"));
}

#[test]
fn test_adversarial_nesting_is_bounded() {
    let factory = Factory::with_config(FactoryConfig::new().max_depth(4));
    let mut deep = RawValue::from("leaf");
    for _ in 0..10 {
        deep = RawValue::map([("x", deep)]);
    }
    let err = factory
        .new_request(RequestParts::new().input(deep))
        .unwrap_err();
    assert_eq!(err.kind, ConstructionErrorKind::TooDeep { limit: 4 });
    assert_eq!(err.path.unwrap().depth(), 5);
}

#[test]
fn test_request_body_streams_independently() {
    let factory = Factory::new();
    let body = factory.new_body(Some(Resource::from("abcdef")));
    let mut first = body.stream().unwrap().unwrap();
    first.seek(3, Whence::Start).unwrap();
    let mut second = body.stream().unwrap().unwrap();
    assert_eq!(second.read_remaining().unwrap(), "abcdef");
    assert_eq!(first.read_remaining().unwrap(), "def");
    assert_eq!(body.contents().unwrap(), "abcdef");
}
