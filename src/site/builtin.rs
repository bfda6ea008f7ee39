//! Site definitions shipped with the binary

use crate::site::types::{
    default_id_pattern, default_sku_selector, default_stock_locations, default_title_selector,
};
use crate::site::{FieldDefinition, SiteDefinition, Transform};

/// Returns every built-in site definition, in registration order
pub fn definitions() -> Vec<SiteDefinition> {
    vec![g2s()]
}

/// G2S Equipment (g2stobeq.ca) product and inventory lookup
pub fn g2s() -> SiteDefinition {
    let labelled = |name: &str, label: &str, transform: Transform| {
        FieldDefinition::named(name)
            .selector(format!("dt:-soup-contains('{}') + dd", label))
            .transform(transform)
    };

    let fields = vec![
        // Filled in by the pipeline itself
        FieldDefinition::named("Status Code").default_value("200"),
        FieldDefinition::named("Exists").default_value("No"),
        FieldDefinition::named("Price")
            .selector("div.productView")
            .attribute("data-product-price")
            .transform(Transform::ExtractNumeric),
        labelled("Montreal", "stock-montreal:", Transform::ExtractNumeric),
        labelled("Mississauga", "stock-mississauga:", Transform::ExtractNumeric),
        labelled("Edmonton", "stock-edmonton:", Transform::ExtractNumeric),
        labelled("Dropship Item", "Dropship Item:", Transform::CleanText),
        labelled("LTL - Freight Extra", "LTL - Freight Extra:", Transform::CleanText),
        labelled("Special Order Items", "Special Order Items:", Transform::CleanText),
        labelled("While Quantities Last", "While Quantities Last:", Transform::CleanText),
        labelled("less-than-truckload", "less-than-truckload:", Transform::CleanText),
    ];

    let output_columns = [
        "Part Number",
        "Status Code",
        "Exists",
        "Price",
        "Montreal",
        "Mississauga",
        "Edmonton",
        "Dropship Item",
        "LTL - Freight Extra",
        "Special Order Items",
        "While Quantities Last",
        "less-than-truckload",
        "In Stock",
        "Status",
        "Error",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    SiteDefinition {
        id: "g2s".to_string(),
        name: "G2S Equipment".to_string(),
        description: "G2S Equipment product and inventory scraper (g2stobeq.ca)".to_string(),
        base_url: "https://g2stobeq.ca".to_string(),
        search_path: "/search.php".to_string(),
        search_param_name: "search_query".to_string(),
        product_link_selector: r#"a[data-event-type="product-click"]"#.to_string(),
        product_link_attribute: "href".to_string(),
        fields,
        id_pattern: default_id_pattern(),
        normalize_id: true,
        require_exact_match: true,
        title_selector: default_title_selector(),
        sku_selector: default_sku_selector(),
        success_field: "Price".to_string(),
        stock_locations: default_stock_locations(),
        output_columns,
    }
}
