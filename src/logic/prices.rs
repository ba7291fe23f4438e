use tracing::debug;

use crate::models::{Catalog, Confidence, Crop, PriceContext, PriceQuote};

/// Resolves a price for one crop. The tiers form an ordered strategy chain;
/// the first that yields a value wins:
///
/// 1. manual/CSV table entry for this exact crop name -> high confidence
/// 2. catalog base price (> 0) -> medium confidence
/// 3. mean of tier-1/2 prices of the crop's group peers -> low confidence
/// 4. 0.0 -> low confidence
///
/// Never returns an absent price; pure over its inputs.
pub fn resolve_price(crop: &Crop, ctx: &PriceContext, catalog: &Catalog) -> PriceQuote {
    if let Some(quote) = manual_tier(crop, ctx) {
        return quote;
    }
    if let Some(quote) = catalog_tier(crop) {
        return quote;
    }
    if let Some(quote) = group_average_tier(crop, ctx, catalog) {
        debug!(crop = %crop.name, price = quote.value, "price derived from group peers");
        return quote;
    }
    PriceQuote::new(0.0, "group average", Confidence::Low)
}

fn manual_tier(crop: &Crop, ctx: &PriceContext) -> Option<PriceQuote> {
    // ManualPrice::new already rejects negatives; entries built by hand
    // are skipped here so the quote stays >= 0 regardless.
    ctx.manual_price(&crop.name)
        .filter(|entry| entry.price_eur_t.is_finite() && entry.price_eur_t >= 0.0)
        .map(|entry| PriceQuote::new(entry.price_eur_t, "manual price table", Confidence::High))
}

fn catalog_tier(crop: &Crop) -> Option<PriceQuote> {
    match crop.price_eur_t {
        Some(price) if price > 0.0 => Some(PriceQuote::new(price, "catalog", Confidence::Medium)),
        _ => None,
    }
}

/// Mean over group peers that have a manual or catalog price themselves.
/// The crop itself is skipped; by the time this tier runs it has neither.
fn group_average_tier(crop: &Crop, ctx: &PriceContext, catalog: &Catalog) -> Option<PriceQuote> {
    let mut values = Vec::new();
    for peer in catalog.iter() {
        if peer.group != crop.group || peer.name == crop.name {
            continue;
        }
        let peer_price = ctx
            .manual_price(&peer.name)
            .map(|entry| entry.price_eur_t)
            .filter(|&p| p > 0.0)
            .or(peer.price_eur_t.filter(|&p| p > 0.0));
        if let Some(price) = peer_price {
            values.push(price);
        }
    }
    if values.is_empty() {
        return None;
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Some(PriceQuote::new(avg, "group average", Confidence::Low))
}

/// Checks a resolved price against the crop group's plausible band.
/// Groups without a band accept anything.
pub fn price_in_sane_range(crop: &Crop, price_eur_t: f64) -> bool {
    match crop.group.sane_price_range() {
        Some((min, max)) => price_eur_t >= min && price_eur_t <= max,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CropGroup, ManualPrice};
    use approx::assert_relative_eq;

    fn catalog() -> Catalog {
        Catalog::from_crops(vec![
            Crop::new("Wheat", CropGroup::Cereals).with_price(200.0),
            Crop::new("Barley", CropGroup::Cereals).with_price(180.0),
            Crop::new("Oats", CropGroup::Cereals),
            Crop::new("Rapeseed", CropGroup::Oilseed).with_price(450.0),
        ])
    }

    #[test]
    fn manual_entry_wins_with_high_confidence() {
        let catalog = catalog();
        let ctx = PriceContext::new().with_manual_price("Wheat", ManualPrice::new(230.0, "csv").unwrap());
        let quote = resolve_price(catalog.get("Wheat").unwrap(), &ctx, &catalog);
        assert_eq!(quote.value, 230.0);
        assert_eq!(quote.confidence, Confidence::High);
    }

    #[test]
    fn catalog_price_is_medium_confidence() {
        let catalog = catalog();
        let ctx = PriceContext::new();
        let quote = resolve_price(catalog.get("Barley").unwrap(), &ctx, &catalog);
        assert_eq!(quote.value, 180.0);
        assert_eq!(quote.confidence, Confidence::Medium);
    }

    #[test]
    fn group_average_covers_priceless_crops() {
        let catalog = catalog();
        let ctx = PriceContext::new();
        // Oats has no price; peers Wheat (200) and Barley (180) average 190.
        let quote = resolve_price(catalog.get("Oats").unwrap(), &ctx, &catalog);
        assert_relative_eq!(quote.value, 190.0, epsilon = 1e-9);
        assert_eq!(quote.confidence, Confidence::Low);
    }

    #[test]
    fn group_average_prefers_manual_peer_prices() {
        let catalog = catalog();
        let ctx = PriceContext::new().with_manual_price("Wheat", ManualPrice::new(240.0, "csv").unwrap());
        let quote = resolve_price(catalog.get("Oats").unwrap(), &ctx, &catalog);
        // (240 + 180) / 2
        assert_relative_eq!(quote.value, 210.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_manual_entry_never_breaks_price_totality() {
        // A table entry built field-by-field bypasses ManualPrice::new;
        // the resolver must still never quote below zero.
        let catalog = catalog();
        let mut ctx = PriceContext::new();
        ctx.manual.insert(
            "Wheat".to_string(),
            ManualPrice {
                price_eur_t: -50.0,
                source_type: "csv".to_string(),
                as_of: None,
            },
        );

        let quote = resolve_price(catalog.get("Wheat").unwrap(), &ctx, &catalog);
        assert!(quote.value >= 0.0);
        // The manual tier is skipped, so the catalog price wins.
        assert_eq!(quote.value, 200.0);
        assert_eq!(quote.confidence, Confidence::Medium);

        // The bad entry is also kept out of peer group averages: Oats sees
        // Wheat's catalog price (200) and Barley (180).
        let oats = resolve_price(catalog.get("Oats").unwrap(), &ctx, &catalog);
        assert_relative_eq!(oats.value, 190.0, epsilon = 1e-9);
    }

    #[test]
    fn resolution_is_total() {
        // Lone crop in its group with no price anywhere: degrades to 0.0.
        let catalog = Catalog::from_crops(vec![Crop::new("Clover", CropGroup::Legume)]);
        let ctx = PriceContext::new();
        let quote = resolve_price(catalog.get("Clover").unwrap(), &ctx, &catalog);
        assert_eq!(quote.value, 0.0);
        assert_eq!(quote.confidence, Confidence::Low);
        assert!(quote.value >= 0.0);
    }

    #[test]
    fn sane_range_by_group() {
        let wheat = Crop::new("Wheat", CropGroup::Cereals);
        assert!(price_in_sane_range(&wheat, 200.0));
        assert!(!price_in_sane_range(&wheat, 600.0));
        assert!(!price_in_sane_range(&wheat, 50.0));

        let herbs = Crop::new("Caraway", CropGroup::Other);
        assert!(price_in_sane_range(&herbs, 2500.0));
    }
}
