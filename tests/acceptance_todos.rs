use axum::body::to_bytes;
use axum::Router;
use serde_json::{json, Value};
use todos::domain::{auth::Authenticator, repository::TodoRepository};
use todos::http::{routes, routing, state::AppState};
use todos::infrastructure::{sqlite, sqlite_auth::SqliteAuthenticator, sqlite_repo::SqliteTodoRepository};

async fn app() -> Router {
    // use in-memory sqlite for tests
    let pool = sqlite::connect("sqlite::memory:").await.unwrap();
    let repo = SqliteTodoRepository::new(pool.clone());
    repo.init().await.unwrap();
    let auth = SqliteAuthenticator::new(pool);
    auth.init().await.unwrap();
    routing::app(routes::router(AppState::new(auth, repo)))
}

#[tokio::test]
async fn acceptance_signup_create_filter_delete() {
    let app = app().await;

    let res = request(&app, "GET", "/health", None, None).await;
    assert_eq!(res.status(), 200);

    // anonymous access is rejected
    let res = request(&app, "GET", "/todos", None, None).await;
    assert_eq!(res.status(), 401);

    // signup
    let res = request(&app, "POST", "/signup", None, Some(json!({ "username": "ada", "password": "secret" }))).await;
    assert_eq!(res.status(), 201);
    let token = body(res).await["token"].as_str().unwrap().to_string();

    // create a, b, c
    let mut ids = Vec::new();
    for content in ["a", "b", "c"] {
        let res = request(&app, "POST", "/todos", Some(&token), Some(json!({ "content": content }))).await;
        assert_eq!(res.status(), 201);
        let todo = body(res).await;
        ids.push(todo["id"].as_str().unwrap().to_string());
    }
    let list = body(request(&app, "GET", "/todos", Some(&token), None).await).await;
    let orders: Vec<i64> = list["items"].as_array().unwrap().iter().map(|t| t["order"].as_i64().unwrap()).collect();
    assert_eq!(orders, vec![1, 2, 3]);

    // toggle b
    let res = request(&app, "POST", &format!("/todos/{}/toggle", ids[1]), Some(&token), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body(res).await["done"], json!(true));

    // select completed
    let list = body(request(&app, "PUT", "/filter", Some(&token), Some(json!({ "filter": "completed" }))).await).await;
    assert_eq!(list["filter"], json!("completed"));
    assert_eq!(contents(&list), vec!["b"]);
    assert_eq!(list["stats"], json!({ "total": 3, "done": 1, "remaining": 2, "all_done": false }));

    // route to active, then back in history to completed
    let list = body(request(&app, "GET", "/filter/active", Some(&token), None).await).await;
    assert_eq!(contents(&list), vec!["a", "c"]);
    let res = request(&app, "GET", "/filter/bogus", Some(&token), None).await;
    assert_eq!(res.status(), 404);
    request(&app, "PUT", "/filter", Some(&token), Some(json!({ "filter": "all" }))).await;
    let list = body(request(&app, "POST", "/filter/back", Some(&token), None).await).await;
    assert_eq!(list["filter"], json!("completed"));
    let list = body(request(&app, "POST", "/filter/forward", Some(&token), None).await).await;
    assert_eq!(list["filter"], json!("all"));

    // delete b
    let res = request(&app, "DELETE", &format!("/todos/{}", ids[1]), Some(&token), None).await;
    assert_eq!(res.status(), 204);
    let res = request(&app, "DELETE", &format!("/todos/{}", ids[1]), Some(&token), None).await;
    assert_eq!(res.status(), 404);

    // next create gets order 4 and resets the filter to all
    let todo = body(request(&app, "POST", "/todos", Some(&token), Some(json!({ "content": "" }))).await).await;
    assert_eq!(todo["order"], json!(4));
    assert_eq!(todo["content"], json!("empty todo..."));
    let list = body(request(&app, "GET", "/todos", Some(&token), None).await).await;
    assert_eq!(list["filter"], json!("all"));

    // edit a to empty content; it sticks
    let res = request(&app, "PUT", &format!("/todos/{}", ids[0]), Some(&token), Some(json!({ "content": "" }))).await;
    assert_eq!(body(res).await["content"], json!(""));
}

#[tokio::test]
async fn acceptance_login_errors_and_relogin_refetches() {
    let app = app().await;
    let creds = json!({ "username": "ada", "password": "secret" });
    let token = body(request(&app, "POST", "/signup", None, Some(creds.clone())).await).await["token"].as_str().unwrap().to_string();

    let res = request(&app, "POST", "/signup", None, Some(creds.clone())).await;
    assert_eq!(res.status(), 409);

    let res = request(&app, "POST", "/login", None, Some(json!({ "username": "ada", "password": "nope" }))).await;
    assert_eq!(res.status(), 401);
    assert_eq!(body(res).await["message"], json!("Invalid username or password. Please try again."));

    request(&app, "POST", "/todos", Some(&token), Some(json!({ "content": "keep" }))).await;
    request(&app, "POST", "/todos/toggle-all", Some(&token), Some(json!({ "done": true }))).await;
    request(&app, "PUT", "/filter", Some(&token), Some(json!({ "filter": "active" }))).await;

    let res = request(&app, "POST", "/logout", Some(&token), None).await;
    assert_eq!(res.status(), 204);
    let res = request(&app, "GET", "/todos", Some(&token), None).await;
    assert_eq!(res.status(), 401);

    let res = request(&app, "POST", "/login", None, Some(creds)).await;
    assert_eq!(res.status(), 200);
    let token = body(res).await["token"].as_str().unwrap().to_string();
    let session = body(request(&app, "GET", "/session", Some(&token), None).await).await;
    assert_eq!(session["username"], json!("ada"));

    let list = body(request(&app, "GET", "/todos", Some(&token), None).await).await;
    assert_eq!(list["filter"], json!("all"));
    assert_eq!(contents(&list), vec!["keep"]);
    assert_eq!(list["items"][0]["done"], json!(true));

    let cleared = body(request(&app, "POST", "/todos/clear-completed", Some(&token), None).await).await;
    assert_eq!(cleared["count"], json!(1));
}

fn contents(list: &Value) -> Vec<String> {
    list["items"].as_array().unwrap().iter().map(|t| t["content"].as_str().unwrap().to_string()).collect()
}

async fn body(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let mut req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req.header("content-type", "application/json").body(Body::from(json.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}
