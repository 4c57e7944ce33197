// API integration tests
//
// Purpose: exercise every route through the router with temp-dir stores and
// a scripted analysis client
// Run with: cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use companion_guide::{
        create_router, AiSuggestion, AnalysisError, AppState, ConfirmedCrop, DiaryStore,
        ExternalAnalysisClient, ImageInput, KnowledgeBaseHandle, PlantStore, RecommendationContext,
        RecommendationEngine,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt; // for oneshot

    struct ScriptedClient;

    #[async_trait]
    impl ExternalAnalysisClient for ScriptedClient {
        async fn identify(
            &self,
            image: &ImageInput,
            notes: &str,
        ) -> Result<Vec<ConfirmedCrop>, AnalysisError> {
            assert_eq!(image.mime_type, "image/png");
            if notes.contains("nothing") {
                return Err(AnalysisError::NoCropsIdentified);
            }
            Ok(vec![ConfirmedCrop {
                name: "Tomato".to_string(),
                id: Some("crop_0".to_string()),
            }])
        }

        async fn suggest(
            &self,
            _: &[String],
            _: &RecommendationContext,
        ) -> Result<Vec<AiSuggestion>, AnalysisError> {
            Ok(vec![AiSuggestion {
                plant: "Clover".to_string(),
                reason: "fixes nitrogen".to_string(),
            }])
        }
    }

    // Helper: app over a temp data dir; the TempDir must outlive the app
    fn create_test_app(with_ai: bool) -> (axum::Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBaseHandle::new();
        let client: Option<Arc<dyn ExternalAnalysisClient>> =
            if with_ai { Some(Arc::new(ScriptedClient)) } else { None };

        let mut engine = RecommendationEngine::new(kb.clone());
        if let Some(c) = &client {
            engine = engine.with_client(c.clone());
        }

        let state = AppState::from_parts(
            kb.clone(),
            engine,
            PlantStore::new(dir.path().join("plants.json"), kb),
            DiaryStore::new(dir.path().join("diary.json")),
            client,
        );
        (create_router(state), dir)
    }

    // Helper: Parse JSON response
    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn multipart_request(notes: &str, with_image: bool) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = String::new();
        if with_image {
            body.push_str(&format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"plot.png\"\r\n\
                 Content-Type: image/png\r\n\r\nPNGDATA\r\n",
                b = boundary
            ));
        }
        body.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n{notes}\r\n--{b}--\r\n",
            b = boundary,
            notes = notes
        ));

        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    }

    async fn seed_plants(app: &axum::Router) {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/plants/import",
                json!({
                    "tomato": {
                        "name": "Tomato",
                        "companions": ["Basil", "Marigold"],
                        "antagonists": ["Fennel"]
                    },
                    "basil": {"name": "Basil", "benefits": ["pest-deterrence"]},
                    "marigold": {
                        "name": "Marigold",
                        "benefits": ["pest-deterrence", "pollinator-attraction"],
                        "soil_requirements": {"ph_range": [6.0, 7.0]}
                    }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // =========================================================================
    // Section 1: Health Check
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let (app, _dir) = create_test_app(false);

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
        assert_eq!(body["knowledge_base"]["state"], "unloaded");
        assert!(body["search_index"].is_null());
        assert_eq!(body["analysis_configured"], false);
        assert_eq!(body["ai_fallback"], false);
    }

    #[tokio::test]
    async fn test_health_reports_loaded_index() {
        let (app, _dir) = create_test_app(true);
        seed_plants(&app).await;

        let response = app.oneshot(get("/health")).await.unwrap();
        let body: Value = json_response(response).await;
        assert_eq!(body["knowledge_base"]["state"], "loaded");
        assert_eq!(body["knowledge_base"]["records"], 3);
        assert_eq!(body["search_index"]["plant_count"], 3);
        assert_eq!(body["ai_fallback"], true);
    }

    // =========================================================================
    // Section 2: Recommendations
    // =========================================================================

    #[tokio::test]
    async fn test_recommend_from_database() {
        let (app, _dir) = create_test_app(true);
        seed_plants(&app).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/recommend",
                json!({"crops": ["Tomato"], "context": {"soil_ph": 5.0}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["plant"], "Marigold");
        assert_eq!(recs[0]["source"], "database");
        assert_eq!(recs[0]["support"], 1);
        assert!(recs[0]["reason"].as_str().unwrap().contains("pH 6.0-7.0"));
        assert_eq!(recs[1]["plant"], "Basil");
    }

    #[tokio::test]
    async fn test_recommend_unknown_crop_uses_ai() {
        let (app, _dir) = create_test_app(true);

        let response = app
            .oneshot(json_request(
                "POST",
                "/recommend",
                json!({"crops": [{"name": "UnknownPlantXYZ", "id": "crop_0"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert_eq!(
            body["recommendations"],
            json!([{"plant": "Clover", "reason": "fixes nitrogen", "source": "ai"}])
        );
    }

    #[tokio::test]
    async fn test_recommend_errors() {
        let (app, _dir) = create_test_app(false);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/recommend", json!({"crops": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Nothing local and no AI configured
        let response = app
            .oneshot(json_request("POST", "/api/recommend", json!({"crops": ["Tomato"]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("try different crops"));
    }

    // =========================================================================
    // Section 3: Identification
    // =========================================================================

    #[tokio::test]
    async fn test_analyze_image() {
        let (app, _dir) = create_test_app(true);

        let response = app.clone().oneshot(multipart_request("raised bed", true)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["identified_crops"], json!([{"name": "Tomato", "id": "crop_0"}]));

        let response = app.clone().oneshot(multipart_request("notes only", false)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(multipart_request("nothing here", true)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_analyze_without_api_key() {
        let (app, _dir) = create_test_app(false);

        let response = app.oneshot(multipart_request("", true)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    // =========================================================================
    // Section 4: Plant database
    // =========================================================================

    #[tokio::test]
    async fn test_plant_routes() {
        let (app, _dir) = create_test_app(false);
        seed_plants(&app).await;

        let response = app.clone().oneshot(get("/api/plants?per_page=2")).await.unwrap();
        let body = json_response(response).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["items"][0]["name"], "Basil");

        let response = app.clone().oneshot(get("/api/plants/search?q=mari")).await.unwrap();
        let body = json_response(response).await;
        assert_eq!(body["results"][0]["id"], "marigold");

        let response = app.clone().oneshot(get("/api/plants/marigold/details")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["soil"]["ph_range"]["min"], 6.0);
        assert!(body.get("harvest").is_none());

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/plants", json!({"name": "Basil"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/plants", json!({"name": "Borage"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/plants/borage",
                json!({"name": "Borage", "benefits": "pollinators"}),
            ))
            .await
            .unwrap();
        let body = json_response(response).await;
        assert_eq!(body["benefits"], json!(["pollinators"]));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/plants/borage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/api/plants/borage")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // =========================================================================
    // Section 5: Diary
    // =========================================================================

    #[tokio::test]
    async fn test_diary_routes() {
        let (app, _dir) = create_test_app(false);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/diary",
                json!({"date": "2024-05-01", "title": "Planted tomatoes", "crops": ["Tomato"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_response(response).await;
        assert_eq!(created["id"], 1);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/diary", json!({"title": " "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/diary/1",
                json!({"title": "Planted tomatoes", "notes": "Two rows", "weather": "sunny"}),
            ))
            .await
            .unwrap();
        let body = json_response(response).await;
        assert_eq!(body["date"], "2024-05-01");
        assert_eq!(body["weather"], "sunny");

        let response = app
            .clone()
            .oneshot(get("/api/diary?crop=tomato&from=2024-01-01"))
            .await
            .unwrap();
        let body = json_response(response).await;
        assert_eq!(body["total"], 1);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/diary/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/api/diary/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
