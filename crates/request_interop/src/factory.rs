use std::num::NonZeroU64;

use request_interop_api::{
    ConstructionError, ConstructionErrorKind, Field, FieldPath, Method, RawValue, Resource,
    Upload, UploadStatus,
};

use crate::http::{
    body::RequestBody,
    header::{HeaderMap, HeaderName},
    params::ParamMap,
    request::{Request, RequestParts},
    tree::{self, FileEntry, InputValue, QueryValue, Walker},
    upload::{FileUpload, UploadNode, UploadParts},
    url::{Url, UrlParts},
};

/// How strictly a [`Factory`] treats raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryConfig {
    /// How deep any raw tree (files, input, query, uploads) may nest
    pub max_depth: usize,
    /// How many keys the cookies, files, input and query trees may each hold, counting
    /// nested keys. `parse_query` stops decoding at this many fields.
    pub max_fields: usize,
    /// Lowercase raw header names, rather than rejecting names that are not lowercase
    pub lowercase_header_names: bool,
}

impl FactoryConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 32;
    pub const DEFAULT_MAX_FIELDS: usize = 1000;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_fields(mut self, max_fields: usize) -> Self {
        self.max_fields = max_fields;
        self
    }

    pub fn lowercase_header_names(mut self, lowercase: bool) -> Self {
        self.lowercase_header_names = lowercase;
        self
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_fields: Self::DEFAULT_MAX_FIELDS,
            lowercase_header_names: true,
        }
    }
}

/// The one place raw transport data turns into request values.
///
/// Every operation either returns a fully validated value or a [`ConstructionError`] naming
/// the input and the key path that was rejected.
#[derive(Debug, Clone, Default)]
pub struct Factory {
    config: FactoryConfig,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn new_url(&self, parts: UrlParts) -> Result<Url, ConstructionError> {
        Url::from_parts(parts).map_err(|kind| reject(kind, Field::Url, None))
    }

    /// Parses a URL string into a validated [`Url`]
    pub fn parse_url(&self, url: &str) -> Result<Url, ConstructionError> {
        url.parse().inspect_err(|err| log::debug!("rejected url: {err}"))
    }

    pub fn new_upload(&self, parts: UploadParts) -> Result<FileUpload, ConstructionError> {
        let UploadParts {
            tmp_name,
            error,
            name,
            full_path,
            media_type,
            size,
            body,
        } = parts;

        let fail = |kind, key: &str| reject(kind, Field::Upload, Some(key));

        if tmp_name.is_empty() {
            return Err(fail(ConstructionErrorKind::EmptyTmpName, "tmp_name"));
        }
        let status = UploadStatus::from_code(error)
            .ok_or_else(|| fail(ConstructionErrorKind::InvalidUploadStatus(error), "error"))?;
        for (key, value) in [
            ("name", &name),
            ("full_path", &full_path),
            ("type", &media_type),
        ] {
            if value.as_deref() == Some("") {
                return Err(fail(ConstructionErrorKind::EmptyComponent(key), key));
            }
        }
        let size = size
            .map(|size| {
                u64::try_from(size)
                    .ok()
                    .and_then(NonZeroU64::new)
                    .ok_or_else(|| fail(ConstructionErrorKind::InvalidSize(size), "size"))
            })
            .transpose()?;

        Ok(FileUpload::new(
            tmp_name, status, name, full_path, media_type, size, body,
        ))
    }

    pub fn new_body(&self, resource: Option<Resource>) -> RequestBody {
        RequestBody::new(resource)
    }

    pub fn new_request(&self, parts: RequestParts) -> Result<Request, ConstructionError> {
        let RequestParts {
            cookies,
            files,
            headers,
            input,
            method,
            query,
            server,
            uploads,
            url,
            body,
        } = parts;
        let max_depth = self.config.max_depth;

        let method = match method.as_deref() {
            None | Some("") => Method::GET,
            Some(method) => method.parse().map_err(|err| {
                reject(ConstructionErrorKind::InvalidMethod(err), Field::Method, None)
            })?,
        };
        let cookies = self.bounded_walker(Field::Cookies).string_map(cookies)?;
        let files = FileEntry::map_from_raw(&mut self.bounded_walker(Field::Files), files)?;
        let headers = self.headers(headers)?;
        let input = tree_from_raw(
            self.bounded_walker(Field::Input),
            input,
            InputValue::map_from_raw,
        )?;
        let query = tree_from_raw(
            self.bounded_walker(Field::Query),
            query,
            QueryValue::map_from_raw,
        )?;
        let server = Walker::new(Field::Server, max_depth).string_map(server)?;
        let uploads = uploads.unwrap_or_default();
        Walker::new(Field::Uploads, max_depth).check_depth(&uploads, UploadNode::children)?;

        Ok(Request {
            cookies,
            files,
            headers,
            input,
            method,
            query,
            server,
            uploads,
            url: url.unwrap_or_default(),
            body: RequestBody::new(body),
        })
    }

    /// Decodes a query string with bracketed field names into a query tree
    pub fn parse_query(&self, query: &str) -> ParamMap<QueryValue> {
        tree::parse_query(query, self.config.max_depth, self.config.max_fields)
    }

    /// Builds the uploads tree matching a files tree. Files whose `tmp_name` is empty never
    /// reached temporary storage and are left out.
    pub fn uploads_from_files(&self, files: &ParamMap<FileEntry>) -> ParamMap<UploadNode> {
        let mut uploads = ParamMap::new();
        for (field, entry) in files {
            for (keys, item) in entry.items() {
                if item.tmp_name.is_empty() {
                    continue;
                }
                let upload = FileUpload::new(
                    item.tmp_name,
                    item.error,
                    item.name,
                    item.full_path,
                    item.media_type,
                    item.size.and_then(NonZeroU64::new),
                    None,
                );
                insert_upload(&mut uploads, field, &keys, upload);
            }
        }
        uploads
    }

    /// A walker for the trees a client fills in directly, bounded in depth and size
    fn bounded_walker(&self, field: Field) -> Walker {
        Walker::new(field, self.config.max_depth).max_fields(self.config.max_fields)
    }

    fn headers(&self, raw: Option<RawValue>) -> Result<HeaderMap, ConstructionError> {
        let mut walker = Walker::new(Field::Headers, self.config.max_depth);
        let entries = walker.top_level(raw)?;
        let mut headers = HeaderMap::with_capacity(entries.len());
        for (key, value) in entries {
            let (name, value) = walker.descend(&key, |w| {
                let name = if self.config.lowercase_header_names {
                    HeaderName::normalize(&key)
                } else {
                    HeaderName::new(key.as_str())
                }
                .map_err(|err| w.error(ConstructionErrorKind::InvalidHeaderName(err)))?;
                Ok((name, header_value(w, value)?))
            })?;
            // RFC 9110 5.3: repeated fields combine into one comma separated list
            headers.append(name, value);
        }
        Ok(headers)
    }
}

fn reject(kind: ConstructionErrorKind, field: Field, key: Option<&str>) -> ConstructionError {
    let path: FieldPath = key.into_iter().collect();
    let err = ConstructionError::new(kind, field).at(&path);
    log::debug!("rejected request input: {err}");
    err
}

fn tree_from_raw<V>(
    mut walker: Walker,
    raw: Option<RawValue>,
    map_from_raw: fn(&mut Walker, RawValue) -> Result<ParamMap<V>, ConstructionError>,
) -> Result<ParamMap<V>, ConstructionError> {
    match raw {
        None | Some(RawValue::Null) => Ok(ParamMap::new()),
        Some(raw) => map_from_raw(&mut walker, raw),
    }
}

/// A header value is a non-empty string, or a list of them sent as separate fields
fn header_value(walker: &mut Walker, raw: RawValue) -> Result<String, ConstructionError> {
    match raw {
        RawValue::String(value) if value.is_empty() => {
            Err(walker.error(ConstructionErrorKind::EmptyValue))
        }
        RawValue::String(value) => Ok(value),
        RawValue::List(values) if values.is_empty() => {
            Err(walker.error(ConstructionErrorKind::EmptyValue))
        }
        RawValue::List(values) => {
            let mut joined = String::new();
            for (i, value) in values.into_iter().enumerate() {
                let value = walker.descend(&i.to_string(), |w| match value {
                    RawValue::String(value) if !value.is_empty() => Ok(value),
                    RawValue::String(_) => Err(w.error(ConstructionErrorKind::EmptyValue)),
                    other => Err(w.unexpected("string", &other)),
                })?;
                if !joined.is_empty() {
                    joined.push_str(", ");
                }
                joined.push_str(&value);
            }
            Ok(joined)
        }
        other => Err(walker.unexpected("string", &other)),
    }
}

fn insert_upload(
    uploads: &mut ParamMap<UploadNode>,
    key: &str,
    rest: &[String],
    upload: FileUpload,
) {
    match rest.split_first() {
        None => {
            if uploads.insert(key, UploadNode::Upload(upload)).is_some() {
                log::warn!("upload under {key:?} replaced an earlier entry");
            }
        }
        Some((next, rest)) => {
            match uploads.get_or_insert_with(key, || UploadNode::Map(ParamMap::new())) {
                UploadNode::Map(nested) => insert_upload(nested, next, rest, upload),
                UploadNode::Upload(_) => {
                    log::warn!(
                        "dropped upload {:?}: {key:?} already holds a single upload",
                        upload.tmp_name()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use request_interop_api::Body;

    use super::*;

    #[test]
    fn test_new_url_example() {
        let url = Factory::new()
            .new_url(
                UrlParts::new()
                    .scheme("https")
                    .host("example.com")
                    .port(443)
                    .path("/a"),
            )
            .unwrap();
        assert_eq!(url.to_string(), "https://example.com:443/a");
    }

    #[test]
    fn test_new_url_rejects() {
        let factory = Factory::new();
        let err = factory
            .new_url(UrlParts::new().scheme("ftp").host("h"))
            .unwrap_err();
        assert_eq!(err.field, Field::Url);
        assert!(matches!(err.kind, ConstructionErrorKind::InvalidScheme(_)));

        let err = factory
            .new_url(UrlParts::new().host("h").port(70000))
            .unwrap_err();
        assert_eq!(err.kind, ConstructionErrorKind::PortOutOfRange(70000));

        assert!(factory.parse_url("https://example.com/a?b#c").is_ok());
        assert!(factory.parse_url("gopher://example.com").is_err());
    }

    #[test]
    fn test_new_upload_validates() {
        let factory = Factory::new();
        let upload = factory
            .new_upload(UploadParts::new("/tmp/x", 0).name("photo.png").size(1024))
            .unwrap();
        assert_eq!(upload.tmp_name(), "/tmp/x");
        assert_eq!(upload.error(), UploadStatus::OK);
        assert_eq!(upload.name(), Some("photo.png"));
        assert_eq!(upload.size().map(NonZeroU64::get), Some(1024));
        assert_eq!(upload.contents().unwrap(), "");

        let err = factory.new_upload(UploadParts::new("", 0)).unwrap_err();
        assert_eq!(err.kind, ConstructionErrorKind::EmptyTmpName);
        assert_eq!(err.path.unwrap().to_string(), "tmp_name");

        for code in [-1, 9, 300] {
            let err = factory.new_upload(UploadParts::new("/tmp/x", code)).unwrap_err();
            assert_eq!(err.kind, ConstructionErrorKind::InvalidUploadStatus(code));
        }

        for size in [0, -3] {
            let err = factory
                .new_upload(UploadParts::new("/tmp/x", 0).size(size))
                .unwrap_err();
            assert_eq!(err.kind, ConstructionErrorKind::InvalidSize(size));
        }

        let err = factory
            .new_upload(UploadParts::new("/tmp/x", 0).media_type(""))
            .unwrap_err();
        assert_eq!(err.kind, ConstructionErrorKind::EmptyComponent("type"));
    }

    #[test]
    fn test_upload_with_body() {
        let upload = Factory::new()
            .new_upload(UploadParts::new("/tmp/x", 0).body("raw part"))
            .unwrap();
        assert_eq!(upload.contents().unwrap(), "raw part");
    }

    #[test]
    fn test_new_request_defaults() {
        let req = Factory::new().new_request(RequestParts::new()).unwrap();
        assert_eq!(req.method(), Method::GET);
        assert!(req.cookies().is_empty());
        assert!(req.headers().is_empty());
        assert!(req.query().is_empty());
        assert!(req.input().is_empty());
        assert!(req.server().is_empty());
        assert!(req.files().is_empty());
        assert!(req.uploads().is_empty());
        assert_eq!(req.url().to_string(), "");

        let req = Factory::new()
            .new_request(RequestParts::new().method("").query(RawValue::Null))
            .unwrap();
        assert_eq!(req.method(), Method::GET);
        assert!(req.query().is_empty());
    }

    #[test]
    fn test_new_request_methods() {
        let factory = Factory::new();
        for (raw, method) in [("post", Method::POST), ("Patch", Method::PATCH)] {
            let req = factory.new_request(RequestParts::new().method(raw)).unwrap();
            assert_eq!(req.method(), method);
            assert_eq!(req.method().as_str(), raw.to_ascii_uppercase());
        }
        let err = factory
            .new_request(RequestParts::new().method("PROPFIND"))
            .unwrap_err();
        assert_eq!(err.field, Field::Method);
        assert!(matches!(err.kind, ConstructionErrorKind::InvalidMethod(_)));
    }

    #[test]
    fn test_headers_are_normalized() {
        let req = Factory::new()
            .new_request(
                RequestParts::new()
                    .header("Content-Type", "text/plain")
                    .header("accept", "text/html")
                    .header("Accept", "*/*")
                    .header("X-Forwarded-For", "10.0.0.1"),
            )
            .unwrap();
        let names: Vec<_> = req.headers().iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["content-type", "accept", "x-forwarded-for"]);
        assert_eq!(req.header("accept"), Some("text/html, */*"));
        assert_eq!(req.header("Content-Type"), Some("text/plain"));

        let req = Factory::new()
            .new_request(RequestParts::new().headers(RawValue::map([(
                "via",
                RawValue::List(vec!["1.1 a".into(), "1.1 b".into()]),
            )])))
            .unwrap();
        assert_eq!(req.header("via"), Some("1.1 a, 1.1 b"));
    }

    #[test]
    fn test_headers_rejected() {
        let strict = Factory::with_config(FactoryConfig::new().lowercase_header_names(false));
        let err = strict
            .new_request(RequestParts::new().header("Host", "example.com"))
            .unwrap_err();
        assert_eq!(err.field, Field::Headers);
        assert!(matches!(err.kind, ConstructionErrorKind::InvalidHeaderName(_)));

        let factory = Factory::new();
        let err = factory
            .new_request(RequestParts::new().header("host", ""))
            .unwrap_err();
        assert_eq!(err.kind, ConstructionErrorKind::EmptyValue);
        assert_eq!(err.path.unwrap().to_string(), "host");

        let err = factory
            .new_request(RequestParts::new().header("bad name", "x"))
            .unwrap_err();
        assert!(matches!(err.kind, ConstructionErrorKind::InvalidHeaderName(_)));
    }

    #[test]
    fn test_uploads_from_files() {
        let factory = Factory::new();
        let files = RawValue::map([
            (
                "avatar",
                RawValue::map([
                    ("tmp_name", RawValue::from("/tmp/php1")),
                    ("error", RawValue::from(0_i64)),
                    ("name", RawValue::from("me.png")),
                    ("size", RawValue::from(0_i64)),
                ]),
            ),
            (
                "docs",
                RawValue::map([
                    (
                        "tmp_name",
                        RawValue::List(vec!["/tmp/php2".into(), "".into()]),
                    ),
                    (
                        "error",
                        RawValue::List(vec![RawValue::from(0_i64), RawValue::from(4_i64)]),
                    ),
                ]),
            ),
        ]);
        let req = factory
            .new_request(RequestParts::new().files(files))
            .unwrap();
        let uploads = factory.uploads_from_files(req.files());

        let avatar = uploads.get("avatar").and_then(UploadNode::as_upload).unwrap();
        assert_eq!(avatar.name(), Some("me.png"));
        assert_eq!(avatar.size(), None);

        let docs = uploads.get("docs").unwrap();
        assert_eq!(
            docs.get("0").and_then(UploadNode::as_upload).map(|u| u.tmp_name()),
            Some("/tmp/php2")
        );
        assert!(docs.get("1").is_none());

        let req = factory
            .new_request(RequestParts::new().uploads(uploads))
            .unwrap();
        assert_eq!(req.uploads().len(), 2);
    }

    #[test]
    fn test_depth_limit_applies_to_every_tree() {
        let factory = Factory::with_config(FactoryConfig::new().max_depth(2));
        let deep = RawValue::map([("a", RawValue::map([("b", RawValue::map([("c", "x")]))]))]);
        let err = factory
            .new_request(RequestParts::new().input(deep.clone()))
            .unwrap_err();
        assert_eq!(err.kind, ConstructionErrorKind::TooDeep { limit: 2 });
        assert_eq!(err.field, Field::Input);

        let err = factory
            .new_request(RequestParts::new().query(deep))
            .unwrap_err();
        assert_eq!(err.field, Field::Query);
        assert_eq!(err.path.unwrap().to_string(), "a[b][c]");

        assert!(factory.parse_query("a[b][c]=x").is_empty());
    }

    #[test]
    fn test_field_limit_applies_to_client_trees() {
        let factory = Factory::with_config(FactoryConfig::new().max_fields(3));
        let wide = RawValue::map([("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
        for (parts, field) in [
            (RequestParts::new().cookies(wide.clone()), Field::Cookies),
            (RequestParts::new().input(wide.clone()), Field::Input),
            (RequestParts::new().query(wide.clone()), Field::Query),
        ] {
            let err = factory.new_request(parts).unwrap_err();
            assert_eq!(err.kind, ConstructionErrorKind::TooManyFields { limit: 3 });
            assert_eq!(err.field, field);
            assert_eq!(err.path.unwrap().to_string(), "d");
        }

        // nested keys count too
        let nested = RawValue::map([(
            "a",
            RawValue::map([("b", "1"), ("c", "2"), ("d", "3")]),
        )]);
        let err = factory
            .new_request(RequestParts::new().input(nested))
            .unwrap_err();
        assert_eq!(err.path.unwrap().to_string(), "a[d]");

        // server variables are not client fields
        let req = factory
            .new_request(RequestParts::new().server(wide))
            .unwrap();
        assert_eq!(req.server().len(), 4);

        let query = factory.parse_query("a=1&b=2&c=3&d=4");
        assert_eq!(query.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(Factory::new().config().max_fields, FactoryConfig::DEFAULT_MAX_FIELDS);
    }

    #[test]
    fn test_insert_upload_keeps_first_on_collision() {
        let upload = |tmp_name: &str| {
            FileUpload::new(tmp_name.into(), UploadStatus::OK, None, None, None, None, None)
        };
        let mut uploads = ParamMap::new();
        let first = upload("/tmp/a");
        let nested = upload("/tmp/b");
        insert_upload(&mut uploads, "doc", &[], first);
        insert_upload(&mut uploads, "doc", &["0".to_string()], nested);

        let doc = uploads.get("doc").and_then(UploadNode::as_upload).unwrap();
        assert_eq!(doc.tmp_name(), "/tmp/a");
        assert_eq!(uploads.len(), 1);
    }

    #[test]
    fn test_request_body() {
        let factory = Factory::new();
        let req = factory
            .new_request(RequestParts::new().body("{\"a\":1}"))
            .unwrap();
        assert_eq!(req.contents().unwrap(), "{\"a\":1}");
        assert!(req.request_body().is_present());
        assert_eq!(factory.new_body(None).contents().unwrap(), "");
    }
}
