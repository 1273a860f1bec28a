//! Order and line state machines
//!
//! Pure transition tables. Every transition is listed explicitly; anything
//! not in the table is invalid, including every transition out of a
//! terminal state. The presentation tables (label / style tag) live next to
//! the transition tables so the two cannot drift independently.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Order status
// ============================================================================

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 刚下单 - created, nothing sent to the kitchen yet
    #[default]
    Ordenado,
    /// Kitchen is working on it
    EnProceso,
    /// Ready for the waiter to pick up
    ListoParaEntregar,
    /// Delivered to the table
    Entregado,
    /// Closed and paid (terminal)
    Finalizado,
    /// Cancelled (terminal)
    Cancelado,
}

/// All order states, for exhaustive table checks
pub const ALL_ORDER_STATUSES: [OrderStatus; 6] = [
    OrderStatus::Ordenado,
    OrderStatus::EnProceso,
    OrderStatus::ListoParaEntregar,
    OrderStatus::Entregado,
    OrderStatus::Finalizado,
    OrderStatus::Cancelado,
];

impl OrderStatus {
    /// Single-step transition table
    pub fn can_transition(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Ordenado, EnProceso)
                | (EnProceso, ListoParaEntregar)
                | (ListoParaEntregar, Entregado)
                | (Entregado, Finalizado)
                | (Ordenado, Cancelado)
                | (EnProceso, Cancelado)
                | (ListoParaEntregar, Cancelado)
        )
    }

    /// No further transition is accepted from a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Finalizado | OrderStatus::Cancelado)
    }

    /// Reachability in zero or more steps - the reconciliation guard.
    ///
    /// `is_reachable(s, s)` is true so duplicate events are accepted as
    /// no-ops instead of being treated as regressions.
    pub fn is_reachable(self, target: OrderStatus) -> bool {
        if self == target {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match target {
            OrderStatus::Cancelado => matches!(
                self,
                OrderStatus::Ordenado | OrderStatus::EnProceso | OrderStatus::ListoParaEntregar
            ),
            _ => match (self.rank(), target.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    /// Position on the main chain; `Cancelado` is off-chain
    fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Ordenado => Some(0),
            OrderStatus::EnProceso => Some(1),
            OrderStatus::ListoParaEntregar => Some(2),
            OrderStatus::Entregado => Some(3),
            OrderStatus::Finalizado => Some(4),
            OrderStatus::Cancelado => None,
        }
    }

    /// Display label, shared by every view
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Ordenado => "Ordenado",
            OrderStatus::EnProceso => "En proceso",
            OrderStatus::ListoParaEntregar => "Listo para entregar",
            OrderStatus::Entregado => "Entregado",
            OrderStatus::Finalizado => "Finalizado",
            OrderStatus::Cancelado => "Cancelado",
        }
    }

    /// Style tag consumed by views (badge colour class)
    pub fn style_tag(self) -> &'static str {
        match self {
            OrderStatus::Ordenado => "secondary",
            OrderStatus::EnProceso => "warning",
            OrderStatus::ListoParaEntregar => "info",
            OrderStatus::Entregado => "primary",
            OrderStatus::Finalizado => "success",
            OrderStatus::Cancelado => "danger",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Line status
// ============================================================================

/// Order line lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStatus {
    /// Not picked up by the kitchen yet
    #[default]
    Pendiente,
    /// Being prepared
    EnPreparacion,
    /// Ready for pickup
    ListoParaEntregar,
    /// Delivered to the table (terminal)
    Entregado,
    /// Cancelled (terminal)
    Cancelado,
}

/// All line states, for exhaustive table checks
pub const ALL_LINE_STATUSES: [LineStatus; 5] = [
    LineStatus::Pendiente,
    LineStatus::EnPreparacion,
    LineStatus::ListoParaEntregar,
    LineStatus::Entregado,
    LineStatus::Cancelado,
];

impl LineStatus {
    /// Single-step transition table
    pub fn can_transition(self, target: LineStatus) -> bool {
        use LineStatus::*;
        matches!(
            (self, target),
            (Pendiente, EnPreparacion)
                | (EnPreparacion, ListoParaEntregar)
                | (ListoParaEntregar, Entregado)
                | (Pendiente, Cancelado)
                | (EnPreparacion, Cancelado)
        )
    }

    /// No further transition is accepted from a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, LineStatus::Entregado | LineStatus::Cancelado)
    }

    /// Reachability in zero or more steps - the reconciliation guard
    pub fn is_reachable(self, target: LineStatus) -> bool {
        if self == target {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match target {
            LineStatus::Cancelado => {
                matches!(self, LineStatus::Pendiente | LineStatus::EnPreparacion)
            }
            _ => match (self.rank(), target.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    fn rank(self) -> Option<u8> {
        match self {
            LineStatus::Pendiente => Some(0),
            LineStatus::EnPreparacion => Some(1),
            LineStatus::ListoParaEntregar => Some(2),
            LineStatus::Entregado => Some(3),
            LineStatus::Cancelado => None,
        }
    }

    /// Display label, shared by every view
    pub fn label(self) -> &'static str {
        match self {
            LineStatus::Pendiente => "Pendiente",
            LineStatus::EnPreparacion => "En preparación",
            LineStatus::ListoParaEntregar => "Listo para entregar",
            LineStatus::Entregado => "Entregado",
            LineStatus::Cancelado => "Cancelado",
        }
    }

    /// Style tag consumed by views (badge colour class)
    pub fn style_tag(self) -> &'static str {
        match self {
            LineStatus::Pendiente => "secondary",
            LineStatus::EnPreparacion => "warning",
            LineStatus::ListoParaEntregar => "info",
            LineStatus::Entregado => "success",
            LineStatus::Cancelado => "danger",
        }
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The complete set of valid single-step order transitions
    const VALID_ORDER: [(OrderStatus, OrderStatus); 7] = [
        (OrderStatus::Ordenado, OrderStatus::EnProceso),
        (OrderStatus::EnProceso, OrderStatus::ListoParaEntregar),
        (OrderStatus::ListoParaEntregar, OrderStatus::Entregado),
        (OrderStatus::Entregado, OrderStatus::Finalizado),
        (OrderStatus::Ordenado, OrderStatus::Cancelado),
        (OrderStatus::EnProceso, OrderStatus::Cancelado),
        (OrderStatus::ListoParaEntregar, OrderStatus::Cancelado),
    ];

    /// The complete set of valid single-step line transitions
    const VALID_LINE: [(LineStatus, LineStatus); 5] = [
        (LineStatus::Pendiente, LineStatus::EnPreparacion),
        (LineStatus::EnPreparacion, LineStatus::ListoParaEntregar),
        (LineStatus::ListoParaEntregar, LineStatus::Entregado),
        (LineStatus::Pendiente, LineStatus::Cancelado),
        (LineStatus::EnPreparacion, LineStatus::Cancelado),
    ];

    #[test]
    fn order_transition_table_is_exhaustive() {
        for from in ALL_ORDER_STATUSES {
            for to in ALL_ORDER_STATUSES {
                let expected = VALID_ORDER.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expected,
                    "{from:?} -> {to:?} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn line_transition_table_is_exhaustive() {
        for from in ALL_LINE_STATUSES {
            for to in ALL_LINE_STATUSES {
                let expected = VALID_LINE.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expected,
                    "{from:?} -> {to:?} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for to in ALL_ORDER_STATUSES {
            assert!(!OrderStatus::Finalizado.can_transition(to));
            assert!(!OrderStatus::Cancelado.can_transition(to));
        }
        for to in ALL_LINE_STATUSES {
            assert!(!LineStatus::Entregado.can_transition(to));
            assert!(!LineStatus::Cancelado.can_transition(to));
        }
    }

    #[test]
    fn reachability_follows_the_chain() {
        assert!(OrderStatus::Ordenado.is_reachable(OrderStatus::Finalizado));
        assert!(OrderStatus::EnProceso.is_reachable(OrderStatus::Entregado));
        assert!(!OrderStatus::Entregado.is_reachable(OrderStatus::EnProceso));
        // Delivered orders can no longer be cancelled
        assert!(!OrderStatus::Entregado.is_reachable(OrderStatus::Cancelado));
        // Duplicate events are accepted as no-ops
        assert!(OrderStatus::EnProceso.is_reachable(OrderStatus::EnProceso));
        assert!(LineStatus::Entregado.is_reachable(LineStatus::Entregado));
        // A delivered line never regresses
        assert!(!LineStatus::Entregado.is_reachable(LineStatus::ListoParaEntregar));
    }

    #[test]
    fn wire_names_are_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::ListoParaEntregar).unwrap();
        assert_eq!(json, "\"LISTO_PARA_ENTREGAR\"");
        let parsed: LineStatus = serde_json::from_str("\"EN_PREPARACION\"").unwrap();
        assert_eq!(parsed, LineStatus::EnPreparacion);
    }

    #[test]
    fn every_state_has_a_presentation_entry() {
        for s in ALL_ORDER_STATUSES {
            assert!(!s.label().is_empty());
            assert!(!s.style_tag().is_empty());
        }
        for s in ALL_LINE_STATUSES {
            assert!(!s.label().is_empty());
            assert!(!s.style_tag().is_empty());
        }
    }
}
