//! The compiled-in starter catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::{Product, ProductId};

struct Seed {
    id: &'static str,
    name: &'static str,
    artisan: &'static str,
    price: i64,
    tag: Option<&'static str>,
    description: &'static str,
}

const SEEDS: [Seed; 6] = [
    Seed {
        id: "1",
        name: "Embroidered Denim Jacket",
        artisan: "Meera Devi",
        price: 2499,
        tag: Some("Best Seller"),
        description: "Hand-embroidered floral motifs on upcycled denim. One of a kind.",
    },
    Seed {
        id: "2",
        name: "Botanical Canvas Tote",
        artisan: "Priya Sharma",
        price: 899,
        tag: Some("New"),
        description: "Hand-painted botanical art on repurposed canvas. Carry your story.",
    },
    Seed {
        id: "3",
        name: "Patchwork Quilted Vest",
        artisan: "Fatima Begum",
        price: 1899,
        tag: Some("Limited"),
        description: "Vintage fabric scraps stitched into a warm, wearable mosaic.",
    },
    Seed {
        id: "4",
        name: "Embroidered Jeans",
        artisan: "Lakshmi Iyer",
        price: 1999,
        tag: None,
        description: "Floral and butterfly embroidery breathing new life into classic denim.",
    },
    Seed {
        id: "5",
        name: "Silk Beaded Headband",
        artisan: "Anjali Patel",
        price: 599,
        tag: Some("New"),
        description: "Repurposed vintage silk with hand-stitched beadwork detailing.",
    },
    Seed {
        id: "6",
        name: "Block-Printed Cotton Tee",
        artisan: "Ravi Kumar",
        price: 1299,
        tag: None,
        description: "Traditional block printing technique on sustainably sourced cotton.",
    },
];

/// The six starter products, in display order.
///
/// Their `updated_at` is the Unix epoch so that any edited copy wins under
/// timestamp-based sync.
#[must_use]
pub fn default_products() -> Vec<Product> {
    SEEDS
        .iter()
        .map(|seed| {
            let image = format!("/images/product-{}.jpg", seed.id);
            Product {
                id: ProductId::new(seed.id),
                name: seed.name.to_owned(),
                artisan: seed.artisan.to_owned(),
                price: Decimal::from(seed.price),
                image: image.clone(),
                images: vec![image],
                tag: seed.tag.map(str::to_owned),
                description: seed.description.to_owned(),
                updated_at: DateTime::<Utc>::default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_shape() {
        let products = default_products();
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5", "6"]);
        assert!(products.iter().all(|p| p.image == p.images[0]));
        assert_eq!(products[3].tag, None);
        assert_eq!(products[0].price, Decimal::from(2499));
    }
}
