//! Product command handlers for the CLI.
//!
//! Each handler goes through the same [`ClientStore`] the home view uses and
//! turns a failed [`StoreOutcome`] into a non-zero exit.

use catalog_client::{ClientStore, HomeView, StoreOutcome};
use catalog_core::{PriceInput, ProductInput, ProductPatch, SortOrder};

/// Render the home screen after loading `pages` pages. API failures only
/// shorten the listing.
pub(crate) async fn run_browse(
    store: ClientStore,
    search: Option<String>,
    sort: Option<SortOrder>,
    pages: u32,
) -> anyhow::Result<()> {
    let mut view = HomeView::new(store).with_sort(sort);
    view.mount().await;

    if let Some(term) = search {
        view.set_search_input(term);
        view.submit_search().await;
    }

    for _ in 1..pages.max(1) {
        view.on_sentinel_visible().await;
    }

    print!("{}", view.render().await);
    Ok(())
}

pub(crate) async fn run_create(
    store: &ClientStore,
    name: String,
    price: String,
    image: String,
    description: Option<String>,
) -> anyhow::Result<()> {
    let outcome = store
        .create_product(ProductInput {
            name: Some(name),
            price: Some(PriceInput::Text(price)),
            image: Some(image),
            description,
        })
        .await;
    finish(outcome)?;

    if let Some(product) = store.snapshot().await.products.last() {
        println!("id: {}", product.id);
    }
    Ok(())
}

pub(crate) async fn run_update(
    store: &ClientStore,
    id: &str,
    name: Option<String>,
    price: Option<String>,
    image: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let patch = ProductPatch {
        name,
        price: price.map(PriceInput::Text),
        image,
        description: description.map(Some),
    };
    if patch.is_empty() {
        anyhow::bail!(
            "nothing to update; pass at least one of --name, --price, --image, --description"
        );
    }
    finish(store.update_product(id, &patch).await)
}

pub(crate) async fn run_delete(store: &ClientStore, id: &str) -> anyhow::Result<()> {
    finish(store.delete_product(id).await)
}

fn finish(outcome: StoreOutcome) -> anyhow::Result<()> {
    if outcome.success {
        println!("{}", outcome.message);
        Ok(())
    } else {
        anyhow::bail!("{}", outcome.message)
    }
}
