use arcade_common::models::{CreateResponse, Difficulty};
use arcade_server::logic::{Games, breakout::BreakoutGame, minesweeper::MinesweeperGame};
use rocket::{
    http::{ContentType, Header, Status},
    local::blocking::Client,
};

fn client() -> Client {
    Client::tracked(arcade_server::build()).expect("valid rocket instance")
}

fn create_minesweeper(client: &Client, body: &str) -> (Status, Option<CreateResponse>) {
    let response = client
        .post("/minesweeper/create")
        .header(ContentType::JSON)
        .body(body)
        .dispatch();
    let status = response.status();
    (status, response.into_json())
}

#[test]
fn creates_minesweeper_games_at_the_requested_difficulty() {
    let client = client();

    let (status, first) = create_minesweeper(&client, r#"{"difficulty":"medium"}"#);
    assert_eq!(status, Status::Ok);
    let first = first.expect("create response").id;

    let (_, second) = create_minesweeper(&client, "{}");
    let second = second.expect("create response").id;
    assert_ne!(first, second);
    assert!(first.len() >= 5);

    let games = client
        .rocket()
        .state::<Games<MinesweeperGame>>()
        .expect("minesweeper games are managed");
    let game = games.get(&first).expect("game is registered");
    let game = game.try_lock().expect("game is idle");
    assert_eq!(game.difficulty(), Difficulty::Medium);
    assert_eq!(game.board().rows, 16);

    let game = games.get(&second).expect("game is registered");
    assert_eq!(game.try_lock().expect("game is idle").difficulty(), Difficulty::Easy);
}

#[test]
fn unknown_difficulty_is_rejected() {
    let client = client();
    let (status, _) = create_minesweeper(&client, r#"{"difficulty":"impossible"}"#);
    assert_eq!(status, Status::UnprocessableEntity);
}

#[test]
fn creates_breakout_games_without_starting_the_clock() {
    let client = client();

    let response = client.post("/breakout/create").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let id = response
        .into_json::<CreateResponse>()
        .expect("create response")
        .id;

    let games = client
        .rocket()
        .state::<Games<BreakoutGame>>()
        .expect("breakout games are managed");
    let game = games.get(&id).expect("game is registered");
    let game = game.try_lock().expect("game is idle");
    assert!(!game.is_ticking());
    assert_eq!(game.engine().lives, 3);
    assert_eq!(game.engine().bricks.len(), 25);
}

#[test]
fn game_creation_is_rate_limited_per_client() {
    let client = client();

    for _ in 0..5 {
        assert_eq!(create_minesweeper(&client, "{}").0, Status::Ok);
        assert_eq!(client.post("/breakout/create").dispatch().status(), Status::Ok);
    }

    assert_eq!(
        create_minesweeper(&client, "{}").0,
        Status::TooManyRequests
    );

    let other = client
        .post("/breakout/create")
        .header(Header::new("X-Forwarded-For", "203.0.113.7"))
        .dispatch();
    assert_eq!(other.status(), Status::Ok);
}

#[test]
fn sockets_for_unknown_games_are_not_found() {
    let client = client();

    for path in ["/minesweeper/ws?id=missing", "/breakout/ws?id=missing"] {
        let response = client
            .get(path)
            .header(Header::new("Connection", "Upgrade"))
            .header(Header::new("Upgrade", "websocket"))
            .header(Header::new("Sec-WebSocket-Version", "13"))
            .header(Header::new("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ=="))
            .dispatch();
        assert_eq!(response.status(), Status::NotFound, "{path}");
    }
}
