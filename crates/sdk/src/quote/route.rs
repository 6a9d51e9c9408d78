use fastnum::UD128;

use crate::types::{Quote, Route};

/// Total fee of a route group: every split fee of every hop.
pub fn route_group_fee(group: &[Route]) -> UD128 { group.iter().map(Route::total_fee).sum() }

/// Returns the route group of the quote with the lowest total fee.
///
/// Ties go to the group listed first. Empty if the quote has no routes.
pub fn select_best_route(quote: &Quote) -> &[Route] {
    let mut best: Option<(&[Route], UD128)> = None;
    for group in &quote.routes {
        let fee = route_group_fee(group);
        if best.is_none_or(|(_, min)| fee < min) {
            best = Some((group.as_slice(), fee));
        }
    }
    best.map(|(group, _)| group).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;
    use crate::testing::{hop, mon, usdc, weth};

    #[test]
    fn test_cheapest_group_wins() {
        let quote = Quote {
            routes: vec![
                vec![
                    hop(&mon(), &weth(), &["0.1", "0.1"], "0.1"),
                    hop(&weth(), &usdc(), &["0.1"], "0.1"),
                ],
                vec![hop(&mon(), &usdc(), &["0.25"], "0.3")],
            ],
            ..Default::default()
        };

        assert_eq!(route_group_fee(&quote.routes[0]), udec128!(0.3));
        let best = select_best_route(&quote);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].to_symbol, "USDC");

        // Selection does not depend on previous calls
        assert_eq!(select_best_route(&quote), best);
    }

    #[test]
    fn test_tie_goes_to_first_group() {
        let quote = Quote {
            routes: vec![
                vec![hop(&mon(), &weth(), &["0.003"], "0")],
                vec![hop(&mon(), &usdc(), &["0.001", "0.002"], "0")],
            ],
            ..Default::default()
        };
        assert_eq!(select_best_route(&quote)[0].to_symbol, "WETH");
    }

    #[test]
    fn test_no_routes() {
        assert!(select_best_route(&Quote::default()).is_empty());

        // Hops without splits cost nothing
        let quote = Quote {
            routes: vec![
                vec![hop(&mon(), &weth(), &["0.01"], "0")],
                vec![hop(&mon(), &usdc(), &[], "0")],
            ],
            ..Default::default()
        };
        assert_eq!(select_best_route(&quote)[0].to_symbol, "USDC");
    }
}
