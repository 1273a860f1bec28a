//! End-to-end reconciliation: push events in, store state and alerts out

use comanda_client::channel::MemoryHub;
use comanda_client::notify::NoopNotifier;
use comanda_client::store::UpsertOutcome;
use comanda_client::{ClientConfig, ComandaClient};
use chrono::Utc;
use shared::message::{TOPIC_COCINA, events};
use shared::notification::NotificationKind;
use shared::order::{ItemRef, LineStatus, Order, OrderLine, OrderStatus};
use std::sync::Arc;
use std::time::Duration;

fn line(id: &str, status: LineStatus) -> OrderLine {
    OrderLine {
        id: id.to_string(),
        item: ItemRef::dish("d-1"),
        name: "Croquetas".to_string(),
        quantity: 2,
        unit_price: 8.5,
        status,
        is_new: false,
    }
}

fn order(id: &str, status: OrderStatus, lines: Vec<OrderLine>) -> Order {
    Order {
        id: id.to_string(),
        table_id: "t-3".to_string(),
        table_name: Some("Mesa 3".to_string()),
        waiter_id: "w-2".to_string(),
        waiter_name: Some("Marta".to_string()),
        created_at: Utc::now(),
        status,
        lines,
        note: None,
    }
}

fn client(hub: &MemoryHub) -> ComandaClient {
    let config = ClientConfig::builder()
        .api_url("http://localhost:0")
        .reconnect_delay(Duration::from_millis(50))
        .build()
        .unwrap();
    ComandaClient::with_parts(config, Arc::new(hub.clone()), Arc::new(NoopNotifier)).unwrap()
}

async fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn new_order_lands_in_store_and_alerts_once() {
    let hub = MemoryHub::new();
    let client = client(&hub);
    client.start_sync();
    wait_for("connect", || client.channel().is_connected(TOPIC_COCINA)).await;

    let o1 = order("o-1", OrderStatus::Ordenado, vec![line("l-1", LineStatus::Pendiente)]);
    hub.publish(TOPIC_COCINA, events::NUEVO_PEDIDO, &o1).unwrap();

    let store = client.store();
    wait_for("order in store", || store.get("o-1").is_some()).await;

    let queue = client.notifications();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.entries()[0].kind, NotificationKind::NewOrder);
    assert_eq!(queue.unread_count(), 1);

    // The same creation event delivered again changes nothing
    hub.publish(TOPIC_COCINA, events::NUEVO_PEDIDO, &o1).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.len(), 1);
    assert_eq!(queue.len(), 1);

    client.shutdown();
}

#[tokio::test]
async fn ready_lines_alert_once_until_delivered() {
    let hub = MemoryHub::new();
    let client = client(&hub);
    client.start_sync();
    wait_for("connect", || client.channel().is_connected(TOPIC_COCINA)).await;

    let store = client.store();
    let queue = client.notifications();

    hub.publish(
        TOPIC_COCINA,
        events::NUEVO_PEDIDO,
        &order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::EnPreparacion)]),
    )
    .unwrap();
    wait_for("order in store", || store.get("o-1").is_some()).await;

    // Kitchen marks the line ready
    hub.publish(
        TOPIC_COCINA,
        events::ESTADO_COCINA,
        &order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::ListoParaEntregar)]),
    )
    .unwrap();
    wait_for("ready alert", || {
        queue
            .entries()
            .iter()
            .any(|n| n.kind == NotificationKind::ItemsReady)
    })
    .await;
    let alerts_after_ready = queue.len();

    // A repeated event for the same ready line is suppressed
    hub.publish(
        TOPIC_COCINA,
        events::ESTADO_COCINA,
        &order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::ListoParaEntregar)]),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(queue.len(), alerts_after_ready);

    // Delivery closes the window; the line never regresses
    hub.publish(
        TOPIC_COCINA,
        events::ESTADO_COCINA,
        &order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::Entregado)]),
    )
    .unwrap();
    wait_for("line delivered", || {
        store.get("o-1").unwrap().lines[0].status == LineStatus::Entregado
    })
    .await;

    client.shutdown();
}

#[tokio::test]
async fn late_ready_event_never_regresses_a_delivered_line() {
    let hub = MemoryHub::new();
    let client = client(&hub);
    client.start_sync();
    wait_for("connect", || client.channel().is_connected(TOPIC_COCINA)).await;

    let store = client.store();

    hub.publish(
        TOPIC_COCINA,
        events::NUEVO_PEDIDO,
        &order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::Entregado)]),
    )
    .unwrap();
    wait_for("order in store", || store.get("o-1").is_some()).await;

    // A delayed LISTO_PARA_ENTREGAR from the other connection arrives late
    hub.publish(
        TOPIC_COCINA,
        events::ESTADO_COCINA,
        &order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::ListoParaEntregar)]),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        store.get("o-1").unwrap().lines[0].status,
        LineStatus::Entregado
    );

    client.shutdown();
}

#[tokio::test]
async fn command_response_racing_its_own_push_applies_once() {
    let hub = MemoryHub::new();
    let client = client(&hub);
    client.start_sync();
    wait_for("connect", || client.channel().is_connected(TOPIC_COCINA)).await;

    let store = client.store();
    hub.publish(
        TOPIC_COCINA,
        events::NUEVO_PEDIDO,
        &order("o-1", OrderStatus::Ordenado, vec![line("l-1", LineStatus::Pendiente)]),
    )
    .unwrap();
    wait_for("order in store", || store.get("o-1").is_some()).await;

    let mut changes = store.subscribe();

    // The push for the start command lands before the command response
    hub.publish(
        TOPIC_COCINA,
        events::PEDIDO_ACTUALIZADO,
        &order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::EnPreparacion)]),
    )
    .unwrap();
    wait_for("push applied", || {
        store.get("o-1").unwrap().status == OrderStatus::EnProceso
    })
    .await;

    // The command response then reports the same transition
    let response = order("o-1", OrderStatus::EnProceso, vec![line("l-1", LineStatus::EnPreparacion)]);
    assert_eq!(store.upsert(response), UpsertOutcome::Unchanged);

    // Exactly one change for the transition, none for the response
    assert!(changes.try_recv().is_ok());
    assert!(changes.try_recv().is_err());

    client.shutdown();
}

#[tokio::test]
async fn stock_alerts_flow_into_the_queue() {
    let hub = MemoryHub::new();
    let client = client(&hub);
    client.start_sync();
    wait_for("connect", || client.channel().is_connected(TOPIC_COCINA)).await;

    let queue = client.notifications();
    hub.publish(
        TOPIC_COCINA,
        events::STOCK_BAJO,
        &shared::message::StockAlert {
            product_id: "p-1".to_string(),
            name: "Tomate".to_string(),
            remaining: 3,
            threshold: Some(5),
        },
    )
    .unwrap();

    wait_for("stock alert", || {
        queue
            .entries()
            .iter()
            .any(|n| n.kind == NotificationKind::LowStock)
    })
    .await;

    // Same product alerting again inside the window is suppressed
    hub.publish(
        TOPIC_COCINA,
        events::STOCK_BAJO,
        &shared::message::StockAlert {
            product_id: "p-1".to_string(),
            name: "Tomate".to_string(),
            remaining: 2,
            threshold: Some(5),
        },
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(queue.len(), 1);

    client.shutdown();
}

#[tokio::test]
async fn table_map_tracks_active_orders() {
    let hub = MemoryHub::new();
    let client = client(&hub);
    client.start_sync();
    wait_for("connect", || client.channel().is_connected(TOPIC_COCINA)).await;

    let store = client.store();
    let tables = client.table_map();

    hub.publish(
        TOPIC_COCINA,
        events::NUEVO_PEDIDO,
        &order("o-1", OrderStatus::Ordenado, vec![line("l-1", LineStatus::Pendiente)]),
    )
    .unwrap();
    wait_for("order in store", || store.get("o-1").is_some()).await;

    assert!(tables.is_occupied("t-3"));
    let occupied = tables.occupied_tables();
    assert_eq!(occupied.len(), 1);
    assert_eq!(occupied[0].total, 17.0); // 2 x 8.5

    // Cancelled on another client: the table frees up
    hub.publish(
        TOPIC_COCINA,
        events::PEDIDO_ACTUALIZADO,
        &order("o-1", OrderStatus::Cancelado, vec![line("l-1", LineStatus::Cancelado)]),
    )
    .unwrap();
    wait_for("cancel applied", || {
        store.get("o-1").unwrap().status == OrderStatus::Cancelado
    })
    .await;

    assert!(!tables.is_occupied("t-3"));
    // The record is retained even though no view shows it
    assert!(store.get("o-1").is_some());

    client.shutdown();
}
