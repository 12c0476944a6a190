use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use log::info;

use graphql_auth::{
    config::Config,
    identity::{Credentials, IdentityProvider, MemoryIdentity},
    mount_for, AuthSchema, SchemaBuilder,
};

const SDL_ENDPOINT: &str = "/graphql/sdl";

/// Serves GET and POST on every mounted path
async fn execute_graphql(
    schema: web::Data<AuthSchema>,
    req: GraphQLRequest,
    http_request: HttpRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    let headers = http_request.headers();
    let credentials = Credentials::from_headers(|name| {
        headers.get(name).and_then(|value| value.to_str().ok())
    });
    if let Some(credentials) = credentials {
        request = request.data(credentials);
    }
    schema.execute(request).await.into()
}

async fn getsdl(schema: web::Data<AuthSchema>) -> HttpResponse {
    HttpResponse::Ok().body(schema.sdl())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    // Load config
    let config = Config::load()?;

    // build the graphql schema
    let mut builder = SchemaBuilder::new();
    for mount in &config.mounts {
        mount_for(&mut builder, mount.resource.as_str(), mount.options())?;
    }
    let paths = builder.paths();

    let identity: Arc<dyn IdentityProvider> = Arc::new(MemoryIdentity::new(config.confirmable));
    let schema = builder
        .finish(identity)
        .map_err(|e| anyhow::anyhow!("invalid schema: {:?}", e))?;

    info!("Starting http server on {}", config.listen);
    for path in &paths {
        info!("Serving graphql at {}", path);
    }

    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(web::Data::new(schema.clone()))
            .route(SDL_ENDPOINT, web::get().to(getsdl));
        for path in &paths {
            app = app
                .route(path, web::post().to(execute_graphql))
                .route(path, web::get().to(execute_graphql));
        }
        app
    })
    .bind(config.listen.as_str())?
    .run()
    .await?;

    Ok(())
}
