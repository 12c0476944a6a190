use std::sync::Arc;

use async_graphql::{Request, Value};
use serde_json::json;

use crate::{
    fallible::{AUTHENTICATION_ERROR, USER_ERROR},
    identity::{Credentials, DeliveryKind, IdentityProvider, MemoryIdentity},
    mount::{mount_for, MountOptions},
    schema::{AuthSchema, SchemaBuilder},
    tests::Named,
};

const SIGN_UP: &str = r#"
mutation {
    userSignUp(email: "alice@example.com", password: "12345678", passwordConfirmation: "12345678") {
        authenticatable { email confirmed }
        credentials { accessToken }
    }
}"#;

fn seal(builder: SchemaBuilder, identity: Arc<MemoryIdentity>) -> AuthSchema {
    let identity: Arc<dyn IdentityProvider> = identity;
    builder.finish(identity).expect("schema is valid")
}

async fn data(schema: &AuthSchema, request: impl Into<Request>) -> serde_json::Value {
    let response = schema.execute(request.into()).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

async fn error_code(schema: &AuthSchema, request: impl Into<Request>) -> Option<Value> {
    let response = schema.execute(request.into()).await;
    response
        .errors
        .first()
        .and_then(|err| err.extensions.as_ref())
        .and_then(|extensions| extensions.get("code").cloned())
}

#[actix_web::test]
async fn test_sign_up_confirm_login_logout() {
    let identity = Arc::new(MemoryIdentity::new(true));
    let mut builder = SchemaBuilder::new();
    mount_for(&mut builder, "User", MountOptions::new()).unwrap();
    let schema = seal(builder, identity.clone());

    assert_eq!(
        data(&schema, SIGN_UP).await,
        json!({
            "userSignUp": {
                "authenticatable": { "email": "alice@example.com", "confirmed": false },
                "credentials": null
            }
        })
    );

    let token = identity
        .last_token(DeliveryKind::Confirmation, "alice@example.com")
        .expect("confirmation instructions were sent");
    let confirm = format!(
        r#"{{ userConfirmAccount(confirmationToken: "{}") {{ email confirmed }} }}"#,
        token
    );
    assert_eq!(
        data(&schema, confirm).await,
        json!({ "userConfirmAccount": { "email": "alice@example.com", "confirmed": true } })
    );

    let login = r#"
    mutation {
        userLogin(email: "alice@example.com", password: "12345678") {
            authenticatable { id email }
            credentials { accessToken client uid tokenType }
        }
    }"#;
    let session = data(&schema, login).await;
    let id = session["userLogin"]["authenticatable"]["id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
    let credentials = &session["userLogin"]["credentials"];
    assert_eq!(credentials["uid"], "alice@example.com");
    assert_eq!(credentials["tokenType"], "Bearer");

    let logout = "mutation { userLogout { authenticatable { email } } }";
    assert_eq!(
        error_code(&schema, logout).await,
        Some(Value::from(AUTHENTICATION_ERROR))
    );

    let lookup = |name: &str| match name {
        "access-token" => credentials["accessToken"].as_str(),
        "client" => credentials["client"].as_str(),
        "uid" => credentials["uid"].as_str(),
        _ => None,
    };
    let credentials = Credentials::from_headers(lookup).unwrap();
    assert_eq!(
        data(&schema, Request::new(logout).data(credentials)).await,
        json!({ "userLogout": { "authenticatable": { "email": "alice@example.com" } } })
    );
}

#[actix_web::test]
async fn test_user_errors() {
    let identity = Arc::new(MemoryIdentity::new(false));
    let mut builder = SchemaBuilder::new();
    mount_for(&mut builder, "User", MountOptions::new()).unwrap();
    let schema = seal(builder, identity);

    data(&schema, SIGN_UP).await;

    let login = r#"mutation { userLogin(email: "alice@example.com", password: "wrong") { credentials { uid } } }"#;
    assert_eq!(
        error_code(&schema, login).await,
        Some(Value::from(USER_ERROR))
    );

    let response = schema.execute(Request::new(SIGN_UP)).await;
    let extensions = response.errors[0].extensions.as_ref().unwrap();
    assert_eq!(
        extensions.get("detailed_errors"),
        Some(&Value::List(vec![Value::from(
            "Email has already been taken"
        )]))
    );
}

#[actix_web::test]
async fn test_dummy_query_keeps_schema_valid() {
    let mut builder = SchemaBuilder::new();
    mount_for(
        &mut builder,
        "User",
        MountOptions::new().skip(["confirm_account", "check_password_token"]),
    )
    .unwrap();
    let schema = seal(builder, Arc::new(MemoryIdentity::default()));

    assert_eq!(data(&schema, "{ dummy }").await, json!({ "dummy": "" }));
}

#[actix_web::test]
async fn test_schema_without_mutations() {
    let mut builder = SchemaBuilder::new();
    mount_for(
        &mut builder,
        "User",
        MountOptions::new().only(["confirm_account"]),
    )
    .unwrap();
    let schema = seal(builder, Arc::new(MemoryIdentity::default()));

    let sdl = schema.sdl();
    assert!(sdl.contains("userConfirmAccount("));
    assert!(sdl.contains("confirmationToken: String!"));
    assert!(sdl.contains("type Authenticatable"));
    assert!(!sdl.contains("type Mutation"));
    assert!(!sdl.contains("dummy"));
}

#[actix_web::test]
async fn test_two_resources_share_the_schema() {
    let mut builder = SchemaBuilder::new();
    mount_for(&mut builder, "User", MountOptions::new().only(["login"])).unwrap();
    mount_for(
        &mut builder,
        "Admin/Staff",
        MountOptions::new()
            .only(["login"])
            .additional_query("server_name", Arc::new(Named("minkan")))
            .at("/admin/graphql_auth"),
    )
    .unwrap();
    assert_eq!(builder.paths(), ["/graphql_auth", "/admin/graphql_auth"]);

    let schema = seal(builder, Arc::new(MemoryIdentity::default()));
    let sdl = schema.sdl();
    assert!(sdl.contains("userLogin("));
    assert!(sdl.contains("adminStaffLogin("));
    assert!(sdl.contains("type AdminStaffLoginPayload"));
    assert!(sdl.contains("type Credentials"));

    assert_eq!(
        data(&schema, "{ serverName }").await,
        json!({ "serverName": "minkan" })
    );
}
