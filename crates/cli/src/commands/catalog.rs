//! Catalog inspection commands.
//!
//! The storefront trusts the catalog JSON at startup; these checks run in
//! CI and before deploys so data errors are caught at the workbench, not
//! by a buyer.

#![allow(clippy::print_stdout)] // CLI output goes to stdout by design

use std::collections::HashSet;
use std::path::Path;

use tabletop_reboxing_storefront::catalog::CatalogStore;

/// Validate the catalog, printing each finding.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or any finding is
/// reported, so CI fails on bad data.
pub fn validate(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = CatalogStore::load(dir)?;
    let mut findings: Vec<String> = Vec::new();

    // Duplicate ids
    let mut seen_products = HashSet::new();
    for product in store.products() {
        if !seen_products.insert(product.id.clone()) {
            findings.push(format!("duplicate product id: {}", product.id));
        }
    }
    let mut seen_categories = HashSet::new();
    for category in store.categories() {
        if !seen_categories.insert(category.id.clone()) {
            findings.push(format!("duplicate category id: {}", category.id));
        }
    }

    // Per-product data errors
    for product in store.products() {
        if store.category(&product.category).is_none() {
            findings.push(format!(
                "product {} references unknown category {}",
                product.id, product.category
            ));
        }
        if product.price.amount() <= 0 {
            findings.push(format!(
                "product {} has non-positive price {}",
                product.id,
                product.price.amount()
            ));
        }
        if product.name.trim().is_empty() {
            findings.push(format!("product {} has an empty name", product.id));
        }
        if product.image.trim().is_empty() {
            findings.push(format!("product {} has no image", product.id));
        }
    }

    // Categories with nothing to show are worth flagging too
    for category in store.categories() {
        if store.products_in_category(&category.id).is_empty() {
            findings.push(format!("category {} has no visible products", category.id));
        }
    }

    if findings.is_empty() {
        println!(
            "catalog ok: {} products, {} categories",
            store.products().len(),
            store.categories().len()
        );
        Ok(())
    } else {
        for finding in &findings {
            println!("error: {finding}");
        }
        Err(format!("{} catalog finding(s)", findings.len()).into())
    }
}

/// Print per-category counts and the price range.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn stats(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = CatalogStore::load(dir)?;

    println!("products:   {}", store.products().len());
    println!("categories: {}", store.categories().len());

    let featured = store.products().iter().filter(|p| p.featured).count();
    let hidden = store.products().iter().filter(|p| p.hidden).count();
    let out_of_stock = store.products().iter().filter(|p| p.out_of_stock).count();
    println!("featured:   {featured}");
    println!("hidden:     {hidden}");
    println!("out of stock: {out_of_stock}");

    if let (Some(min), Some(max)) = (
        store.products().iter().map(|p| p.price).min(),
        store.products().iter().map(|p| p.price).max(),
    ) {
        println!("price range: {min} - {max}");
    }

    println!();
    for category in store.categories() {
        println!(
            "{:<24} {} visible products",
            category.id.as_str(),
            store.products_in_category(&category.id).len()
        );
    }

    Ok(())
}
