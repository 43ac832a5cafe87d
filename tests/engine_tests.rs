// Integration tests for the order admission, settlement, pricing, and breaker
// paths, exercised through the public engine API.

use rust_decimal_macros::dec;
use venture_core::*;

struct World {
    engine: Engine,
    game: GameId,
    founder: ParticipantId,
    angel: ParticipantId,
    vc: ParticipantId,
    venture: VentureId,
}

fn world_with(config: GameConfig) -> World {
    let mut engine = Engine::new(EngineConfig::default());
    let game = engine.create_game(config).unwrap();
    let founder = engine.join_game(game, "founder", Role::Founder, None).unwrap();
    let angel = engine.join_game(game, "angel", Role::Angel, None).unwrap();
    let vc = engine.join_game(game, "vc", Role::Vc, None).unwrap();
    let venture = engine
        .create_venture(game, "Rocketly", founder, 1_000)
        .unwrap();
    engine.set_game_status(game, GameStatus::Open).unwrap();
    World {
        engine,
        game,
        founder,
        angel,
        vc,
        venture,
    }
}

fn world() -> World {
    world_with(GameConfig::demo(GameId(1)))
}

fn total_cash(w: &World) -> Cash {
    [w.founder, w.angel, w.vc]
        .iter()
        .map(|id| w.engine.participant(*id).unwrap().current_cash)
        .sum()
}

fn p(v: rust_decimal::Decimal) -> Price {
    Price::new_unchecked(v)
}

#[test]
fn accepted_primary_order_moves_cash_shares_and_supply() {
    let mut w = world();
    let before = total_cash(&w);

    let order = w
        .engine
        .submit_primary_order(w.angel, w.venture, 100, p(dec!(10)), None)
        .unwrap();
    let trade = w
        .engine
        .decide_primary_order(w.founder, order, Decision::Accept)
        .unwrap()
        .unwrap();

    assert_eq!(trade.qty, 100);
    assert_eq!(trade.market_type, MarketType::Primary);
    assert_eq!(trade.seller, None);

    let venture = w.engine.venture(w.venture).unwrap();
    assert_eq!(venture.primary_shares_remaining, 900);
    assert_eq!(venture.last_vwap_price, Some(p(dec!(10))));

    let position = w.engine.position(w.angel, w.venture).unwrap();
    assert_eq!(position.qty_total, 100);
    assert_eq!(position.avg_cost, dec!(10));

    // Buyer pays, founder receives the proceeds, nothing leaks.
    assert_eq!(
        w.engine.participant(w.angel).unwrap().current_cash,
        Cash::new(dec!(49_000))
    );
    assert_eq!(
        w.engine.participant(w.founder).unwrap().current_cash,
        Cash::new(dec!(1_000))
    );
    assert_eq!(total_cash(&w), before);
}

#[test]
fn rejected_order_changes_nothing() {
    let mut w = world();
    let before = total_cash(&w);

    let order = w
        .engine
        .submit_primary_order(w.angel, w.venture, 100, p(dec!(10)), None)
        .unwrap();
    let result = w
        .engine
        .decide_primary_order(w.founder, order, Decision::Reject)
        .unwrap();

    assert!(result.is_none());
    assert_eq!(
        w.engine.primary_order(order).unwrap().status,
        PrimaryOrderStatus::Rejected
    );
    assert!(w.engine.trades().is_empty());
    assert_eq!(w.engine.venture(w.venture).unwrap().primary_shares_remaining, 1_000);
    assert!(w.engine.position(w.angel, w.venture).is_none());
    assert_eq!(total_cash(&w), before);
}

#[test]
fn submission_validates_quantity_funds_and_price_cap() {
    let mut w = world();

    let zero = w
        .engine
        .submit_primary_order(w.angel, w.venture, 0, p(dec!(10)), None);
    assert!(matches!(zero, Err(EngineError::InvalidQuantity { .. })));

    let oversize = w
        .engine
        .submit_primary_order(w.angel, w.venture, 1_001, p(dec!(10)), None);
    assert!(matches!(
        oversize,
        Err(EngineError::InvalidQuantity { available: 1_000, .. })
    ));

    // Angel budget is 50,000; 100 * 1,000 breaks it (at the price cap).
    let broke = w
        .engine
        .submit_primary_order(w.angel, w.venture, 100, p(dec!(1_000)), None);
    assert!(matches!(broke, Err(EngineError::InsufficientFunds { .. })));

    // Demo game caps price at 1,000 per share.
    let capped = w
        .engine
        .submit_primary_order(w.angel, w.venture, 1, p(dec!(1_000.01)), None);
    assert!(matches!(capped, Err(EngineError::PriceOutOfBounds { .. })));
}

#[test]
fn only_the_founder_decides() {
    let mut w = world();
    let order = w
        .engine
        .submit_primary_order(w.angel, w.venture, 10, p(dec!(10)), None)
        .unwrap();

    let err = w
        .engine
        .decide_primary_order(w.vc, order, Decision::Accept)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAuthorized { .. }));
    assert!(w.engine.primary_order(order).unwrap().is_pending());
}

#[test]
fn decisions_are_terminal() {
    let mut w = world();
    let order = w
        .engine
        .submit_primary_order(w.angel, w.venture, 10, p(dec!(10)), None)
        .unwrap();
    w.engine
        .decide_primary_order(w.founder, order, Decision::Accept)
        .unwrap();

    let again = w
        .engine
        .decide_primary_order(w.founder, order, Decision::Accept)
        .unwrap_err();
    assert!(matches!(again, EngineError::OrderAlreadyDecided { .. }));
    assert_eq!(w.engine.trades().len(), 1);
}

#[test]
fn orders_refused_while_game_not_open() {
    let mut engine = Engine::new(EngineConfig::default());
    let game = engine.create_game(GameConfig::demo(GameId(1))).unwrap();
    let founder = engine.join_game(game, "founder", Role::Founder, None).unwrap();
    let angel = engine.join_game(game, "angel", Role::Angel, None).unwrap();
    let venture = engine
        .create_venture(game, "Rocketly", founder, 1_000)
        .unwrap();

    // Still Draft.
    let err = engine
        .submit_primary_order(angel, venture, 10, p(dec!(10)), None)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::MarketClosed {
            reason: MarketClosedReason::GameNotOpen { .. },
            ..
        }
    ));
}

#[test]
fn funds_race_auto_rejects_the_loser() {
    let mut w = world();

    // Two orders, each affordable alone, together over the angel's 50,000.
    let first = w
        .engine
        .submit_primary_order(w.angel, w.venture, 300, p(dec!(100)), None)
        .unwrap();
    let second = w
        .engine
        .submit_primary_order(w.angel, w.venture, 300, p(dec!(100)), None)
        .unwrap();

    w.engine
        .decide_primary_order(w.founder, first, Decision::Accept)
        .unwrap();

    let err = w
        .engine
        .decide_primary_order(w.founder, second, Decision::Accept)
        .unwrap_err();
    match err {
        EngineError::StaleOrder { order, cause } => {
            assert_eq!(order, second);
            assert!(matches!(*cause, EngineError::InsufficientFunds { .. }));
        }
        other => panic!("expected StaleOrder, got {other:?}"),
    }

    // The losing order is closed out, not left dangling.
    assert_eq!(
        w.engine.primary_order(second).unwrap().status,
        PrimaryOrderStatus::Rejected
    );
    let stale_flagged = w.engine.events().iter().any(|e| {
        matches!(
            &e.payload,
            EventPayload::OrderDecided(d) if d.order_id == second && d.stale
        )
    });
    assert!(stale_flagged);
    assert_eq!(w.engine.trades().len(), 1);
}

#[test]
fn supply_race_auto_rejects_the_loser() {
    let mut w = world();

    let first = w
        .engine
        .submit_primary_order(w.angel, w.venture, 800, p(dec!(10)), None)
        .unwrap();
    let second = w
        .engine
        .submit_primary_order(w.vc, w.venture, 800, p(dec!(10)), None)
        .unwrap();

    w.engine
        .decide_primary_order(w.founder, first, Decision::Accept)
        .unwrap();
    let err = w
        .engine
        .decide_primary_order(w.founder, second, Decision::Accept)
        .unwrap_err();
    match err {
        EngineError::StaleOrder { cause, .. } => {
            assert!(matches!(
                *cause,
                EngineError::InsufficientSupply { requested: 800, remaining: 200 }
            ));
        }
        other => panic!("expected StaleOrder, got {other:?}"),
    }
    assert_eq!(w.engine.venture(w.venture).unwrap().primary_shares_remaining, 200);
}

fn buy(w: &mut World, qty: u64, price: rust_decimal::Decimal) {
    let order = w
        .engine
        .submit_primary_order(w.vc, w.venture, qty, p(price), None)
        .unwrap();
    w.engine
        .decide_primary_order(w.founder, order, Decision::Accept)
        .unwrap();
}

#[test]
fn vwap_tracks_last_three_trades() {
    let mut w = world();

    buy(&mut w, 10, dec!(100));
    buy(&mut w, 5, dec!(120));
    buy(&mut w, 20, dec!(90));
    // (10*100 + 5*120 + 20*90) / 35 = 97.142857... -> 97.14
    assert_eq!(
        w.engine.venture(w.venture).unwrap().last_vwap_price,
        Some(p(dec!(97.14)))
    );

    buy(&mut w, 5, dec!(110));
    // Oldest trade drops out: (5*120 + 20*90 + 5*110) / 30 -> 98.33
    assert_eq!(
        w.engine.venture(w.venture).unwrap().last_vwap_price,
        Some(p(dec!(98.33)))
    );
}

#[test]
fn breaker_trips_blocks_and_resumes() {
    let mut w = world();
    let order = w
        .engine
        .submit_primary_order(w.angel, w.venture, 1, p(dec!(10)), None)
        .unwrap();
    w.engine
        .decide_primary_order(w.founder, order, Decision::Accept)
        .unwrap();

    // Heavy trade drags the VWAP from 10 to ~34.98, a ~250% swing on a 200%
    // threshold.
    let order = w
        .engine
        .submit_primary_order(w.vc, w.venture, 999, p(dec!(35)), None)
        .unwrap();
    w.engine
        .decide_primary_order(w.founder, order, Decision::Accept)
        .unwrap();

    assert!(w.engine.breaker_paused(w.venture));
    assert!(w
        .engine
        .events()
        .iter()
        .any(|e| matches!(&e.payload, EventPayload::BreakerTripped(_))));

    let err = w
        .engine
        .submit_primary_order(w.angel, w.venture, 1, p(dec!(30)), None)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::MarketClosed {
            reason: MarketClosedReason::BreakerPaused { .. },
            ..
        }
    ));

    // The pause expires on the engine clock; the next admission clears it.
    w.engine.advance_time(300_000);
    assert!(!w.engine.breaker_paused(w.venture));

    // Can't buy primary (supply exhausted); a listing admission works too.
    w.engine
        .submit_secondary_listing(w.vc, w.venture, 10, p(dec!(30)), None)
        .unwrap();
    assert!(w
        .engine
        .events()
        .iter()
        .any(|e| matches!(&e.payload, EventPayload::BreakerCleared(_))));
}

#[test]
fn breaker_pause_blocks_founder_accepts() {
    let mut w = world();
    buy(&mut w, 1, dec!(10));

    // Order submitted while trading is normal, left pending.
    let pending = w
        .engine
        .submit_primary_order(w.angel, w.venture, 10, p(dec!(12)), None)
        .unwrap();

    // ~250% swing: (1*10 + 800*35) / 801 -> ~34.97 from 10.
    buy(&mut w, 800, dec!(35));
    assert!(w.engine.breaker_paused(w.venture));

    // Accepting settles a trade; the pause blocks it like any admission.
    let err = w
        .engine
        .decide_primary_order(w.founder, pending, Decision::Accept)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::MarketClosed {
            reason: MarketClosedReason::BreakerPaused { .. },
            ..
        }
    ));
    assert!(w.engine.primary_order(pending).unwrap().is_pending());
    assert_eq!(w.engine.trades().len(), 2);

    // Past the deadline the same decision settles normally.
    w.engine.advance_time(300_000);
    let trade = w
        .engine
        .decide_primary_order(w.founder, pending, Decision::Accept)
        .unwrap()
        .unwrap();
    assert_eq!(trade.qty, 10);
    assert_eq!(w.engine.trades().len(), 3);
}

#[test]
fn submit_replay_returns_the_original_order() {
    let mut w = world();
    let key = IdempotencyKey::new("order-1");

    let first = w
        .engine
        .submit_primary_order(w.angel, w.venture, 10, p(dec!(10)), Some(key.clone()))
        .unwrap();
    let replay = w
        .engine
        .submit_primary_order(w.angel, w.venture, 10, p(dec!(10)), Some(key))
        .unwrap();

    assert_eq!(first, replay);
    assert_eq!(w.engine.list_pending_orders(w.venture).len(), 1);
}

#[test]
fn settle_replay_returns_the_original_trade() {
    let mut w = world();
    let key = IdempotencyKey::new("settle-1");

    let trade = w
        .engine
        .settle(w.venture, 50, p(dec!(10)), w.angel, None, Some(key.clone()))
        .unwrap();
    let replay = w
        .engine
        .settle(w.venture, 50, p(dec!(10)), w.angel, None, Some(key))
        .unwrap();

    assert_eq!(trade.id, replay.id);
    assert_eq!(w.engine.trades().len(), 1);
    assert_eq!(
        w.engine.participant(w.angel).unwrap().current_cash,
        Cash::new(dec!(49_500))
    );
}

#[test]
fn closing_the_game_expires_open_orders() {
    let mut w = world();
    let order = w
        .engine
        .submit_primary_order(w.angel, w.venture, 10, p(dec!(10)), None)
        .unwrap();

    // Give the angel shares so a listing can rest too.
    let filled = w
        .engine
        .submit_primary_order(w.angel, w.venture, 100, p(dec!(10)), None)
        .unwrap();
    w.engine
        .decide_primary_order(w.founder, filled, Decision::Accept)
        .unwrap();
    let listing = w
        .engine
        .submit_secondary_listing(w.angel, w.venture, 50, p(dec!(12)), None)
        .unwrap();

    w.engine.set_game_status(w.game, GameStatus::Closed).unwrap();

    assert_eq!(
        w.engine.primary_order(order).unwrap().status,
        PrimaryOrderStatus::Rejected
    );
    assert_eq!(
        w.engine.listing(listing).unwrap().status,
        ListingStatus::Expired
    );
    let expiries = w
        .engine
        .events()
        .iter()
        .filter(|e| matches!(&e.payload, EventPayload::OrderExpired(_)))
        .count();
    assert_eq!(expiries, 2);

    let err = w
        .engine
        .submit_primary_order(w.vc, w.venture, 10, p(dec!(10)), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::MarketClosed { .. }));
}

#[test]
fn pending_orders_listed_oldest_first() {
    let mut w = world();
    let mut ids = Vec::new();
    for i in 0..3 {
        w.engine.advance_time(10);
        ids.push(
            w.engine
                .submit_primary_order(w.angel, w.venture, 10 + i, p(dec!(10)), None)
                .unwrap(),
        );
    }
    let listed: Vec<OrderId> = w
        .engine
        .list_pending_orders(w.venture)
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(listed, ids);
}
