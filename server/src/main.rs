use rocket::{Build, Rocket};
use tracing::info;

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    tracing_subscriber::fmt::init();
    info!("🚀 Starting arcade server");

    let rocket = arcade_server::build();

    info!("🌐 Server configured with CORS, cleanup tasks, and routes");
    info!("📡 Endpoints: POST /minesweeper/create, GET /minesweeper/ws, POST /breakout/create, GET /breakout/ws");

    rocket
}
