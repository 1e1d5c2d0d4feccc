use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use rapydo::api::ApiClient;
use rapydo::config::Config;
use rapydo::editor::{
    owning_tag_type, resolve_picker_choice, Draft, DraftKey, DraftStore, PostForm, TagSelection,
};
use rapydo::model::{CategoryNode, NewCategory, Post, TagPayload, TagType};
use rapydo::render;
use rapydo::search::{newest_first, paginate, search_posts};
use rapydo::tree::{flatten, insert_category, remove_category};

/// Get the config directory path (~/.config/rapydo/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("rapydo"))
}

#[derive(Parser, Debug)]
#[command(name = "rapydo", about = "Command-line client for the rapydo blog API")]
struct Args {
    /// Config file (defaults to ~/.config/rapydo/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the category tree
    Categories,
    /// List categories as breadcrumb picker entries
    Picker,
    /// List posts, newest first
    Posts {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Search posts by title, content, or category name
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// List posts in the given categories
    Browse {
        #[arg(long = "category", required = true, value_name = "ID")]
        categories: Vec<i64>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one post
    Show { id: i64 },
    /// List tag types and their options
    Tags,
    /// Create a category
    AddCategory {
        name: String,
        /// Parent category id; omit for a root category
        #[arg(long)]
        parent: Option<i64>,
        /// Image filename, served from the image root
        #[arg(long)]
        image: String,
    },
    /// Delete a category and its subtree
    RemoveCategory { id: i64 },
    /// Create a post
    NewPost(PostArgs),
    /// Update an existing post
    EditPost {
        id: i64,
        #[command(flatten)]
        post: PostArgs,
    },
    /// Delete a post
    DeletePost { id: i64 },
    /// Create a tag type
    AddTag {
        name: String,
        #[arg(long)]
        mandatory: bool,
        /// Option name (repeatable)
        #[arg(long = "option", value_name = "NAME")]
        options: Vec<String>,
    },
    /// Delete a tag type
    DeleteTag { id: i64 },
    /// Discard a saved draft
    ClearDraft {
        /// Post id; omit for the new-post draft
        id: Option<i64>,
    },
}

#[derive(ClapArgs, Debug)]
struct PostArgs {
    #[arg(long)]
    title: Option<String>,
    /// File holding the serialized content document
    #[arg(long, value_name = "FILE")]
    content: Option<PathBuf>,
    /// Category id or breadcrumb label ("Dev - Web")
    #[arg(long)]
    category: Option<String>,
    /// Tag option id (repeatable, one per tag type)
    #[arg(long = "tag", value_name = "OPTION_ID")]
    tags: Vec<i64>,
    /// Start from the saved draft instead of the server copy
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // The config file may hold the auth token: user-only access.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides();
    tracing::debug!(?config, "Effective configuration");

    let client = ApiClient::new(config.api_config())
        .with_context(|| format!("Invalid server URL '{}'", config.server_url))?;
    let drafts = DraftStore::new(config_dir.join("drafts"));

    run(args.command, &client, &config, &drafts).await
}

async fn run(command: Command, client: &ApiClient, config: &Config, drafts: &DraftStore) -> Result<()> {
    match command {
        Command::Categories => {
            let roots = client.categories().await.context("Failed to fetch categories")?;
            print_lines(render::category_tree(&roots));
        }
        Command::Picker => {
            let roots = client.categories().await.context("Failed to fetch categories")?;
            print_lines(render::picker_lines(&flatten(&roots)));
        }
        Command::Posts { page } => {
            let (mut posts, roots) = tokio::try_join!(client.posts(), client.categories())
                .context("Failed to fetch posts")?;
            newest_first(&mut posts);
            let found: Vec<_> = posts.iter().collect();
            print_page(&found, &roots, page, config.posts_per_page);
        }
        Command::Search { query, page } => {
            let (mut posts, roots) = tokio::try_join!(client.posts(), client.categories())
                .context("Failed to fetch posts")?;
            newest_first(&mut posts);
            let found = search_posts(&posts, &roots, &query);
            print_page(&found, &roots, page, config.posts_per_page);
        }
        Command::Browse { categories, page } => {
            let (mut posts, roots) = tokio::try_join!(
                client.posts_in_categories(&categories),
                client.categories()
            )
            .context("Failed to fetch posts")?;
            newest_first(&mut posts);
            let found: Vec<_> = posts.iter().collect();
            print_page(&found, &roots, page, config.category_posts_per_page);
        }
        Command::Show { id } => {
            let (post, roots, tag_types) =
                tokio::try_join!(client.post(id), client.categories(), client.tags())
                    .with_context(|| format!("Failed to fetch post {id}"))?;
            println!("{}", render::post_detail(&post, &roots, &tag_types));
        }
        Command::Tags => {
            let tag_types = client.tags().await.context("Failed to fetch tags")?;
            print_lines(render::tag_lines(&tag_types));
        }
        Command::AddCategory {
            name,
            parent,
            image,
        } => {
            let roots = client.categories().await.context("Failed to fetch categories")?;
            let payload = NewCategory {
                name,
                parent_id: parent,
                image,
            };
            let created = client
                .create_category(&payload)
                .await
                .context("Failed to create category")?;
            println!("Created category {} ({})", created.name, created.id);
            print_lines(render::category_tree(&insert_category(&roots, parent, created)));
        }
        Command::RemoveCategory { id } => {
            let roots = client.categories().await.context("Failed to fetch categories")?;
            client
                .delete_category(id)
                .await
                .with_context(|| format!("Failed to delete category {id}"))?;
            println!("Deleted category {id}");
            print_lines(render::category_tree(&remove_category(&roots, id)));
        }
        Command::NewPost(post) => {
            let (roots, tag_types) = tokio::try_join!(client.categories(), client.tags())
                .context("Failed to fetch categories and tags")?;
            let form = if post.resume {
                drafts
                    .load(DraftKey::New)
                    .map(|draft| draft.into_form(&tag_types))
                    .unwrap_or_default()
            } else {
                PostForm::default()
            };
            let form = apply_post_args(form, &post, &roots, &tag_types)?;
            submit(client, drafts, DraftKey::New, &form, &tag_types).await?;
        }
        Command::EditPost { id, post } => {
            let (existing, roots, tag_types) =
                tokio::try_join!(client.post(id), client.categories(), client.tags())
                    .with_context(|| format!("Failed to fetch post {id}"))?;
            let key = DraftKey::Post(id);
            let resumed = if post.resume { drafts.load(key) } else { None };
            let form = match resumed {
                Some(draft) => draft.into_form(&tag_types),
                None => PostForm {
                    selection: TagSelection::from_option_ids(
                        &tag_types,
                        existing.selected_option_ids(),
                    ),
                    title: existing.title,
                    content: existing.content,
                    category_id: existing.category_id,
                },
            };
            let form = apply_post_args(form, &post, &roots, &tag_types)?;
            submit(client, drafts, key, &form, &tag_types).await?;
        }
        Command::DeletePost { id } => {
            client
                .delete_post(id)
                .await
                .with_context(|| format!("Failed to delete post {id}"))?;
            drafts.discard(DraftKey::Post(id));
            println!("Deleted post {id}");
        }
        Command::AddTag {
            name,
            mandatory,
            options,
        } => {
            let created = client
                .create_tag(&TagPayload::new(name, mandatory, options))
                .await
                .context("Failed to create tag")?;
            print_lines(render::tag_lines(std::slice::from_ref(&created)));
        }
        Command::DeleteTag { id } => {
            client
                .delete_tag(id)
                .await
                .with_context(|| format!("Failed to delete tag {id}"))?;
            println!("Deleted tag {id}");
        }
        Command::ClearDraft { id } => {
            let key = id.map_or(DraftKey::New, DraftKey::Post);
            drafts.clear(key).context("Failed to delete draft")?;
            println!("Draft cleared");
        }
    }
    Ok(())
}

/// Overlays command-line values on the form.
fn apply_post_args(
    mut form: PostForm,
    args: &PostArgs,
    roots: &[Arc<CategoryNode>],
    tag_types: &[TagType],
) -> Result<PostForm> {
    if let Some(title) = &args.title {
        form.title = title.clone();
    }
    if let Some(path) = &args.content {
        form.content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file '{}'", path.display()))?;
    }
    if let Some(category) = &args.category {
        let id = match category.trim().parse::<i64>() {
            Ok(id) => id,
            Err(_) => resolve_picker_choice(&flatten(roots), category)
                .with_context(|| format!("No category named '{category}'"))?,
        };
        form.category_id = Some(id);
    }
    if !args.tags.is_empty() {
        let mut selection = form.selection.clone();
        for &option_id in &args.tags {
            let tag = owning_tag_type(tag_types, option_id)
                .with_context(|| format!("Unknown tag option {option_id}"))?;
            selection.select(tag.id, option_id);
        }
        form.selection = selection;
    }
    Ok(form)
}

/// Validates and sends the form. The form is kept as a draft until the
/// server accepts it.
async fn submit(
    client: &ApiClient,
    drafts: &DraftStore,
    key: DraftKey,
    form: &PostForm,
    tag_types: &[TagType],
) -> Result<()> {
    if let Err(e) = drafts.save(key, &Draft::from_form(form)) {
        tracing::warn!(error = %e, "Failed to save draft");
    }

    let payload = form.validate(tag_types)?;
    let saved = match key {
        DraftKey::New => client.create_post(&payload).await,
        DraftKey::Post(id) => client.update_post(id, &payload).await,
    }
    .context("Failed to save post; the form is kept as a draft (use --resume)")?;

    drafts.clear(key).context("Failed to delete draft")?;
    println!("Saved post {} ({})", saved.title, saved.id);
    Ok(())
}

fn print_page(
    posts: &[&Post],
    roots: &[Arc<CategoryNode>],
    page: usize,
    per_page: usize,
) {
    let page = paginate(posts, page, per_page);
    for post in page.items {
        println!("{}", render::post_card(post, roots, render::DEFAULT_WIDTH));
    }
    println!("{}", render::page_footer(&page));
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
