use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use log::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

mod api;
mod ledger;

use ledger::storage::{MemoryStorage, SledStorage, Storage};
use ledger::{Engine, Params, StaticSecrets};

const DEMO_ACCOUNTS: [&str; 3] = ["Alice", "Bob", "Charles"];
const DEMO_BALANCE: f64 = 1000.0;

// Initialize the engine against durable storage, falling back to an
// in-memory store when the data directory cannot be used.
fn initialize_engine() -> Engine {
    let data_dir = "data/ledger";
    let secrets = Arc::new(StaticSecrets::demo());

    let engine = match open_sled_engine(data_dir, secrets.clone()) {
        Ok(engine) => {
            info!("Loaded ledger state from {}", data_dir);
            engine
        }
        Err(err) => {
            warn!("Failed to load ledger state from {}: {}", data_dir, err);
            warn!("Running with in-memory state only");

            let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
            Engine::new(Params::default(), secrets, storage)
                .expect("in-memory storage never fails to load")
        }
    };

    if let Err(err) = engine.seed_accounts(&DEMO_ACCOUNTS, DEMO_BALANCE) {
        warn!("Failed to seed demo accounts: {}", err);
    }

    engine
}

fn open_sled_engine(
    data_dir: &str,
    secrets: Arc<StaticSecrets>,
) -> Result<Engine, ledger::EngineError> {
    let storage: Arc<dyn Storage> = Arc::new(SledStorage::open(data_dir)?);
    Engine::new(Params::default(), secrets, storage)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::get_pending_transactions,
        api::handlers::new_transaction,
        api::handlers::mine_block,
        api::handlers::validate_chain,
        api::handlers::get_balances,
        api::handlers::get_balance
    ),
    components(
        schemas(
            ledger::Block,
            ledger::Transaction,
            ledger::BlockSummary,
            api::handlers::ChainResponse,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::MineRequest,
            api::handlers::MineResponse,
            api::handlers::ValidateResponse,
            api::handlers::BalanceResponse
        )
    ),
    tags(
        (name = "ledger", description = "Simulated ledger API endpoints")
    ),
    info(
        title = "Simchain API",
        version = "0.1.0",
        description = "A single-node simulated ledger with proof-of-work sealed blocks",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let engine = web::Data::new(initialize_engine());

    info!("Starting HTTP server at http://localhost:8080");

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(engine.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
