//! Venture exchange simulation.
//!
//! Demonstrates the full game lifecycle: primary issuance with founder
//! approval, VWAP price discovery, circuit breaking, secondary trading, and
//! leaderboard valuation.

use rust_decimal_macros::dec;
use venture_core::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("Venture Exchange Core Simulation");
    println!("One Game, Founder-Gated Issuance, Full Lifecycle\n");

    scenario_1_primary_issuance();
    scenario_2_price_discovery();
    scenario_3_circuit_breaker();
    scenario_4_secondary_market();
    scenario_5_leaderboards();

    println!("\nAll simulations completed successfully.");
}

struct Setup {
    engine: Engine,
    game: GameId,
    founder: ParticipantId,
    angel: ParticipantId,
    vc: ParticipantId,
    venture: VentureId,
}

fn setup() -> Setup {
    let mut engine = Engine::new(EngineConfig::default());
    let game = engine.create_game(GameConfig::demo(GameId(1))).unwrap();
    let founder = engine
        .join_game(game, "dana", Role::Founder, None)
        .unwrap();
    let angel = engine.join_game(game, "alice", Role::Angel, None).unwrap();
    let vc = engine.join_game(game, "victor", Role::Vc, None).unwrap();
    let venture = engine
        .create_venture(game, "Rocketly", founder, 10_000)
        .unwrap();
    engine.set_game_status(game, GameStatus::Open).unwrap();
    Setup {
        engine,
        game,
        founder,
        angel,
        vc,
        venture,
    }
}

/// An angel invests, the founder accepts, cash and supply move together.
fn scenario_1_primary_issuance() {
    println!("Scenario 1: Primary Issuance\n");

    let mut s = setup();
    let price = Price::new_unchecked(dec!(10));

    let order = s
        .engine
        .submit_primary_order(s.angel, s.venture, 500, price, None)
        .unwrap();
    println!("  Alice requests 500 shares @ $10");

    let trade = s
        .engine
        .decide_primary_order(s.founder, order, Decision::Accept)
        .unwrap()
        .unwrap();
    println!("  Dana accepts: trade {} for ${}", trade.id.0, trade.notional());

    let venture = s.engine.venture(s.venture).unwrap();
    let alice = s.engine.participant(s.angel).unwrap();
    let dana = s.engine.participant(s.founder).unwrap();
    println!("  Supply remaining: {}", venture.primary_shares_remaining);
    println!("  Alice cash: ${}, Dana cash: ${}", alice.current_cash, dana.current_cash);
    println!("  Venture price: ${}\n", venture.last_vwap_price.unwrap());
}

/// Three trades make a volume-weighted price; a fourth evicts the oldest.
fn scenario_2_price_discovery() {
    println!("Scenario 2: VWAP Price Discovery\n");

    let mut s = setup();
    for (qty, price) in [(10u64, dec!(100)), (5, dec!(120)), (20, dec!(90))] {
        let order = s
            .engine
            .submit_primary_order(s.vc, s.venture, qty, Price::new_unchecked(price), None)
            .unwrap();
        s.engine
            .decide_primary_order(s.founder, order, Decision::Accept)
            .unwrap();
        let vwap = s.engine.venture(s.venture).unwrap().last_vwap_price.unwrap();
        println!("  Trade {} x ${} -> VWAP ${}", qty, price, vwap);
    }
    println!();
}

/// A violent price swing pauses the venture, then trading resumes on its own.
fn scenario_3_circuit_breaker() {
    println!("Scenario 3: Circuit Breaker\n");

    let mut s = setup();
    let buy = |engine: &mut Engine, buyer, qty, price: rust_decimal::Decimal| {
        let order = engine
            .submit_primary_order(buyer, s.venture, qty, Price::new_unchecked(price), None)
            .unwrap();
        engine
            .decide_primary_order(s.founder, order, Decision::Accept)
            .unwrap();
    };

    buy(&mut s.engine, s.angel, 10, dec!(10));
    println!("  Price established at $10");

    buy(&mut s.engine, s.vc, 200, dec!(35));
    println!("  250% swing to ~$35, breaker paused: {}", s.engine.breaker_paused(s.venture));

    let refused = s.engine.submit_primary_order(
        s.angel,
        s.venture,
        10,
        Price::new_unchecked(dec!(30)),
        None,
    );
    println!("  Admission during pause: {}", refused.unwrap_err());

    s.engine.advance_time(300_000);
    let resumed = s.engine.submit_primary_order(
        s.angel,
        s.venture,
        10,
        Price::new_unchecked(dec!(30)),
        None,
    );
    println!("  After the pause window, admission works again: order {:?}\n", resumed.unwrap());
}

/// Peer-to-peer resale through a listing.
fn scenario_4_secondary_market() {
    println!("Scenario 4: Secondary Market\n");

    let mut s = setup();
    let order = s
        .engine
        .submit_primary_order(s.angel, s.venture, 300, Price::new_unchecked(dec!(10)), None)
        .unwrap();
    s.engine
        .decide_primary_order(s.founder, order, Decision::Accept)
        .unwrap();

    let listing = s
        .engine
        .submit_secondary_listing(s.angel, s.venture, 200, Price::new_unchecked(dec!(14)), None)
        .unwrap();
    println!("  Alice lists 200 shares @ $14");

    let trade = s
        .engine
        .take_secondary_listing(s.vc, listing, 150, None)
        .unwrap();
    println!("  Victor takes 150: trade {} for ${}", trade.id.0, trade.notional());

    let alice_pos = s.engine.position(s.angel, s.venture).unwrap();
    let victor_pos = s.engine.position(s.vc, s.venture).unwrap();
    println!("  Alice holds {}, Victor holds {} @ avg ${}", alice_pos.qty_total, victor_pos.qty_total, victor_pos.avg_cost);
    println!("  Listing remaining: {}\n", s.engine.listing(listing).unwrap().qty_remaining);
}

/// Valuation projections: portfolio rows and both leaderboards.
fn scenario_5_leaderboards() {
    println!("Scenario 5: Leaderboards\n");

    let mut s = setup();
    let second_founder = s
        .engine
        .join_game(s.game, "devi", Role::Founder, None)
        .unwrap();
    let second = s
        .engine
        .create_venture(s.game, "Cloudinary", second_founder, 5_000)
        .unwrap();

    for (buyer, venture, qty, price) in [
        (s.angel, s.venture, 400, dec!(12)),
        (s.vc, s.venture, 900, dec!(15)),
        (s.vc, second, 1_000, dec!(8)),
    ] {
        let order = s
            .engine
            .submit_primary_order(buyer, venture, qty, Price::new_unchecked(price), None)
            .unwrap();
        let founder = s.engine.venture(venture).unwrap().founder;
        s.engine
            .decide_primary_order(founder, order, Decision::Accept)
            .unwrap();
    }

    println!("  Venture leaderboard:");
    for rank in s.engine.venture_leaderboard(s.game).unwrap() {
        match rank.market_cap {
            Some(cap) => println!("    {} market cap ${}", rank.name, cap),
            None => println!("    {} (no trades yet)", rank.name),
        }
    }

    println!("  Investor standings:");
    for row in s
        .engine
        .angel_leaderboard(s.game)
        .unwrap()
        .into_iter()
        .chain(s.engine.vc_leaderboard(s.game).unwrap())
    {
        match row.roi_percent {
            Some(roi) => println!(
                "    {} total ${} roi {:.2}%",
                row.display_name, row.total_value, roi
            ),
            None => println!("    {} total ${}", row.display_name, row.total_value),
        }
    }
}
