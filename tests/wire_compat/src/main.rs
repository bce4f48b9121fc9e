fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use vodup_protocol::urls;
    use vodup_protocol::{
        AssetDescriptor, AuthorizationRequest, ConfirmUploadRequest, CreateAssetRequest,
        PartEntry, ProgressInfo, SignedAuthorization,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_text(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&load_text(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON
    /// values. Key order does not matter.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  ours: {reserialized}"
        );
        parsed
    }

    fn asset() -> AssetDescriptor {
        serde_json::from_value(load_fixture("create_asset_response.json")).unwrap()
    }

    fn sign() -> SignedAuthorization {
        serde_json::from_value(load_fixture("authority_response.json")).unwrap()
    }

    // --- Asset API bodies ---

    #[test]
    fn fixture_create_asset_request() {
        let req = roundtrip_test::<CreateAssetRequest>("create_asset_request.json");
        assert_eq!(req.video_name, "trailer.mp4");
        assert_eq!(req.video_type, "MP4");
    }

    #[test]
    fn fixture_create_asset_response() {
        let asset = roundtrip_test::<AssetDescriptor>("create_asset_response.json");
        assert_eq!(asset.target.bucket, "vod-bucket-cn-north-4");
        assert!(asset.target.object_key.ends_with("/trailer.mp4"));
    }

    #[test]
    fn create_asset_response_tolerates_unknown_fields() {
        let mut value = load_fixture("create_asset_response.json");
        value["target"]["extra"] = serde_json::json!(true);
        value["request_id"] = serde_json::json!("abc");
        let asset: AssetDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(asset, self::asset());
    }

    #[test]
    fn fixture_authority_response() {
        let auth = roundtrip_test::<SignedAuthorization>("authority_response.json");
        assert!(auth.sign_str.starts_with("AccessKeyId="));
        assert!(auth.sign_str.contains("Signature="));
    }

    #[test]
    fn fixture_confirm_request() {
        let req = roundtrip_test::<ConfirmUploadRequest>("confirm_request.json");
        assert_eq!(req, ConfirmUploadRequest::created(asset().asset_id));
    }

    #[test]
    fn fixture_progress_info() {
        let info = roundtrip_test::<ProgressInfo>("progress_info.json");
        assert_eq!(info.percent, 60);
    }

    // --- Object store envelopes ---

    #[test]
    fn fixture_initiate_multipart() {
        let id = vodup_protocol::extract_upload_id(&load_text("initiate_multipart.xml")).unwrap();
        assert_eq!(id.as_deref(), Some("000001929A5F3D2E8B1C47A9D4E6F0B3"));
    }

    #[test]
    fn fixture_list_parts() {
        let parts = vodup_protocol::parse_list_parts(&load_text("list_parts.xml")).unwrap();
        let numbers: Vec<u32> = parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        // ETags keep their quotes.
        assert_eq!(parts[0].etag, "\"b026324c6904b2a9cb4b88d6d61c81d1\"");
    }

    #[test]
    fn listed_parts_build_expected_manifest() {
        let parts = vodup_protocol::parse_list_parts(&load_text("list_parts.xml")).unwrap();
        let manifest = vodup_protocol::build_complete_manifest(&parts);
        assert_eq!(manifest, load_text("complete_manifest.xml").trim());
    }

    #[test]
    fn manifest_reads_back_as_listing() {
        let manifest = load_text("complete_manifest.xml");
        let parts = vodup_protocol::parse_list_parts(&manifest).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[2],
            PartEntry {
                part_number: 3,
                etag: "\"6d7fce9fee471194aa8b5b6e47267f03\"".into(),
            }
        );
    }

    // --- Signed URLs ---

    #[test]
    fn part_authorization_query_order() {
        let req = AuthorizationRequest::upload_part(
            &asset().target,
            "video/mp4",
            "1B2M2Y8AsgTpgAmY7PhCfg==",
            "000001929A5F3D2E8B1C47A9D4E6F0B3",
            2,
        );
        let keys: Vec<&str> = req.query_pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "http_verb",
                "content_type",
                "bucket",
                "object_key",
                "content_md5",
                "upload_id",
                "part_number"
            ]
        );
    }

    #[test]
    fn urls_against_fixture_asset() {
        let asset = asset();
        let base = urls::object_url("https://{bucket}.obs.cn-north-4.myhuaweicloud.com", &asset.target);
        assert_eq!(
            base,
            "https://vod-bucket-cn-north-4.obs.cn-north-4.myhuaweicloud.com/asset/10a5e5ac2c9a4ebb8e81e2e5be2c4d8b/trailer.mp4"
        );

        let auth = sign();
        assert_eq!(
            urls::initiate_url(&base, &auth),
            format!("{base}?uploads&{}", auth.sign_str)
        );
        assert_eq!(
            urls::part_url(&base, 3, "000001929A5F3D2E8B1C47A9D4E6F0B3", &auth),
            format!(
                "{base}?partNumber=3&uploadId=000001929A5F3D2E8B1C47A9D4E6F0B3&{}",
                auth.sign_str
            )
        );
        assert_eq!(
            urls::list_parts_url(&base, "000001929A5F3D2E8B1C47A9D4E6F0B3", &auth),
            format!("{base}?{}&uploadId=000001929A5F3D2E8B1C47A9D4E6F0B3", auth.sign_str)
        );
    }
}
