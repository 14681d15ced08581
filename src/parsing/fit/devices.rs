//! Readable names for FIT manufacturers and Garmin products.

/// Product as found in a DEVICE_INFO message: a profile name when the
/// decoder knows the product, the raw code otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductId {
    Code(u16),
    Name(String),
}

const GARMIN: &str = "garmin";

const GARMIN_PRODUCTS: &[(u16, &str, &str)] = &[
    (717, "fr405", "Forerunner 405"),
    (1018, "fr310xt", "Forerunner 310XT"),
    (1036, "edge500", "Edge 500"),
    (1169, "edge800", "Edge 800"),
    (1328, "fr910xt", "Forerunner 910XT"),
    (1345, "fr610", "Forerunner 610"),
    (1551, "fenix", "Fenix"),
    (1567, "edge810", "Edge 810"),
    (1623, "fr620", "Forerunner 620"),
    (1632, "fr220", "Forerunner 220"),
    (1765, "fr920xt", "Forerunner 920XT"),
    (2050, "fenix3", "Fenix 3"),
    (2067, "edge520", "Edge 520"),
    (2691, "fr935", "Forerunner 935"),
    (2697, "fenix5", "Fenix 5"),
];

/// `gravel_cycling` becomes `Gravel Cycling`.
pub fn readable_name(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Display name of a product, `None` when the product is unknown.
///
/// Raw codes are looked up in the Garmin table for Garmin devices only.
pub fn product_name(manufacturer: &str, product: &ProductId) -> Option<String> {
    match product {
        ProductId::Code(code) if manufacturer == GARMIN => GARMIN_PRODUCTS
            .iter()
            .find(|(known, _, _)| known == code)
            .map(|(_, _, name)| name.to_string()),
        ProductId::Code(_) => None,
        ProductId::Name(raw) => GARMIN_PRODUCTS
            .iter()
            .find(|(_, profile, _)| profile == raw)
            .map(|(_, _, name)| name.to_string())
            .or_else(|| Some(readable_name(raw)).filter(|name| !name.is_empty())),
    }
}

/// `Garmin Forerunner 910XT (SW 2.5)`. Without a known product there is no
/// meaningful device name.
pub fn device_name(
    manufacturer: &str,
    product: &ProductId,
    software_version: Option<f64>,
) -> Option<String> {
    let product = product_name(manufacturer, product)?;
    let mut name = format!("{} {product}", readable_name(manufacturer));
    if let Some(version) = software_version {
        name.push_str(&format!(" (SW {version})"));
    }
    Some(name)
}
