use std::path::{Path, PathBuf};

use crate::app::{AppContext, Result, ShelfError};
use crate::config::Config;
use crate::domain::{EntryKind, ExtractionResult, Issue, ProductRecord, ProductUpdate};
use crate::resolver::batch::resolve_all;
use crate::resolver::Strategy;

pub fn list_directory(ctx: &AppContext, dir: Option<&Path>, verbose: bool) -> Result<()> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => ctx.config.library.home_path.clone().ok_or_else(|| {
            ShelfError::InvalidInput("no directory given and library.home_path is not set".into())
        })?,
    };

    let listing = ctx.resolver.list_directory(&dir)?;

    if listing.entries.is_empty() {
        println!("Empty directory: {}", dir.display());
    }

    for entry in &listing.entries {
        let marker = match (entry.kind, &entry.product) {
            (EntryKind::Folder, Some(p)) if p.has_metadata() => "●",
            (EntryKind::Folder, Some(_)) => "○",
            (EntryKind::Folder, None) => "·",
            (EntryKind::File, _) => " ",
        };
        let source = entry
            .source
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();

        println!("{} {}{}", marker, entry.name, source);
        if let Some(url) = entry.product.as_ref().and_then(|p| p.product_url.as_deref()) {
            println!("    {}", url);
        }
    }

    report_issues(&listing.issues, verbose, "folders could not be registered");
    Ok(())
}

pub fn register(ctx: &AppContext, path: &Path, name: Option<&str>) -> Result<()> {
    let name = match name {
        Some(n) => n.to_string(),
        None => folder_name(path)?,
    };

    if ctx.registry().register(path, &name)? {
        println!("Registered product: {}", name);
    } else {
        println!("Already registered: {}", path.display());
    }
    Ok(())
}

pub fn show(ctx: &AppContext, path: &Path) -> Result<()> {
    match ctx.registry().owning_product(path)? {
        Some(product) => {
            print_product(&product);
            if product.path != crate::registry::normalize_path(path)? {
                println!("  (contains {})", path.display());
            }
        }
        None => println!("Not part of any product: {}", path.display()),
    }
    Ok(())
}

pub fn parent(ctx: &AppContext, path: &Path) -> Result<()> {
    match ctx.registry().nearest_ancestor(path)? {
        Some(product) => print_product(&product),
        None => println!("No parent product for {}", path.display()),
    }
    Ok(())
}

pub struct ManualEdit {
    pub url: Option<String>,
    pub image: Option<String>,
    pub shop: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
}

pub fn update(ctx: &AppContext, path: &Path, edit: ManualEdit) -> Result<()> {
    let stored = ctx.registry().get(path)?.ok_or_else(|| {
        ShelfError::NotFound(format!(
            "{} is not registered (run `assetshelf register` first)",
            path.display()
        ))
    })?;

    let mut update = ProductUpdate::from_record(&stored);
    if edit.url.is_some() {
        update.product_url = edit.url;
    }
    if edit.image.is_some() {
        update.image_url = edit.image;
    }
    if edit.shop.is_some() {
        update.shop_name = edit.shop;
    }
    if edit.clear_tags {
        update.tags.clear();
    } else if !edit.tags.is_empty() {
        update.tags = edit.tags;
    }

    let issues = ctx.registry().update(path, &update)?;
    if let Some(product) = ctx.registry().get(path)? {
        print_product(&product);
    }
    report_issues(&issues, true, "tags could not be saved");
    Ok(())
}

pub async fn search(ctx: &AppContext, name: &str) -> Result<()> {
    let result = ctx.resolver.search(name).await?;
    print_extraction(&result);
    Ok(())
}

pub async fn inspect_image(ctx: &AppContext, url: &str) -> Result<()> {
    let result = ctx.resolver.inspect_product_page(url).await?;
    print_extraction(&result);
    Ok(())
}

pub async fn resolve(
    ctx: &AppContext,
    paths: Vec<PathBuf>,
    strategy: Strategy,
    workers: usize,
) -> Result<()> {
    let total = paths.len();
    let results = resolve_all(ctx.resolver.clone(), paths, strategy, workers).await;

    let mut errors = 0;
    for (path, result) in results {
        match result {
            Ok(resolution) => {
                println!("{} (via {})", path.display(), resolution.resolved_by);
                print_extraction(&resolution.result);
                report_issues(&resolution.issues, true, "issues");
            }
            Err(e) => {
                errors += 1;
                eprintln!("  Error resolving {}: {}", path.display(), e);
            }
        }
    }

    println!("Resolve complete: {} folders, {} errors", total, errors);
    Ok(())
}

pub fn open_product(ctx: &AppContext, path: &Path) -> Result<()> {
    let product = ctx
        .registry()
        .owning_product(path)?
        .ok_or_else(|| ShelfError::NotFound(format!("no product at {}", path.display())))?;
    let url = product.product_url.as_deref().ok_or_else(|| {
        ShelfError::NotFound(format!("{} has no product URL", product.display_name()))
    })?;

    open::that(url)?;
    println!("Opened {}", url);
    Ok(())
}

pub fn set_api_key(key: &str) -> Result<()> {
    let path = config_path()?;
    Config::set_api_key(&path, key).map_err(|e| ShelfError::Config(e.to_string()))?;
    println!("API key saved to {}", path.display());
    Ok(())
}

pub fn print_config_path() -> Result<()> {
    println!("{}", config_path()?.display());
    Ok(())
}

fn config_path() -> Result<PathBuf> {
    Config::default_config_path().map_err(|e| ShelfError::Config(e.to_string()))
}

fn folder_name(path: &Path) -> Result<String> {
    crate::registry::normalize_path(path)?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ShelfError::InvalidInput(format!("no folder name in {}", path.display())))
}

fn print_product(product: &ProductRecord) {
    println!("{}\n  {}", product.display_name(), product.path.display());
    print_field("url", product.product_url.as_deref());
    print_field("image", product.image_url.as_deref());
    print_field("shop", product.shop_name.as_deref());
    if !product.tags.is_empty() {
        println!("  tags:  {}", product.tags.join(", "));
    }
    println!(
        "  registered {}",
        product.registered_at.format("%Y-%m-%d %H:%M")
    );
}

fn print_extraction(result: &ExtractionResult) {
    print_field("url", Some(result.product_url.as_str()));
    print_field("image", Some(result.image_url.as_str()));
    print_field("shop", Some(result.shop_name.as_str()));
}

fn print_field(label: &str, value: Option<&str>) {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => println!("  {:<6} {}", format!("{}:", label), v),
        None => println!("  {:<6} -", format!("{}:", label)),
    }
}

fn report_issues(issues: &[Issue], verbose: bool, summary: &str) {
    if issues.is_empty() {
        return;
    }
    if verbose {
        for issue in issues {
            eprintln!("  warning: {}", issue);
        }
    } else {
        eprintln!("{} {} (use --verbose for details)", issues.len(), summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_update_keeps_unset_fields() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let path = Path::new("/assets/Karin");
        register(&ctx, path, None).unwrap();

        update(
            &ctx,
            path,
            ManualEdit {
                url: Some("https://kawaii-shop.booth.pm/items/5012345".into()),
                image: None,
                shop: Some("kawaii-shop".into()),
                tags: vec!["avatar".into()],
                clear_tags: false,
            },
        )
        .unwrap();
        update(
            &ctx,
            path,
            ManualEdit {
                url: None,
                image: Some("https://booth.pximg.net/4a3f/i/5012345/main.jpg".into()),
                shop: Some(String::new()),
                tags: Vec::new(),
                clear_tags: false,
            },
        )
        .unwrap();

        let product = ctx.registry().get(path).unwrap().unwrap();
        assert_eq!(product.name, "Karin");
        assert_eq!(
            product.product_url.as_deref(),
            Some("https://kawaii-shop.booth.pm/items/5012345")
        );
        assert!(product.image_url.is_some());
        assert_eq!(product.shop_name, None);
        assert_eq!(product.tags, vec!["avatar".to_string()]);
    }

    #[test]
    fn test_update_unregistered_path_fails() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let edit = ManualEdit {
            url: None,
            image: None,
            shop: None,
            tags: Vec::new(),
            clear_tags: true,
        };
        let err = update(&ctx, Path::new("/assets/Missing"), edit).unwrap_err();
        assert!(matches!(err, ShelfError::NotFound(_)));
    }

    #[test]
    fn test_list_without_directory_or_home_path() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        let err = list_directory(&ctx, None, false).unwrap_err();
        assert!(matches!(err, ShelfError::InvalidInput(_)));
    }
}
