//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `famtree_core` linkage with deterministic output.
//! - Optionally summarize a saved tree: `famtree_cli <db-path> [tree-name]`.

use famtree_core::db::open_db;
use famtree_core::{render_scene, LayoutConfig, SqliteTreeRepository, TreeService};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("famtree_core ping={}", famtree_core::ping());
    println!("famtree_core version={}", famtree_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return ExitCode::SUCCESS;
    };

    match summarize(&db_path, args.next().as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &str, tree_name: Option<&str>) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteTreeRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = TreeService::new(repo);

    let Some(tree_name) = tree_name else {
        for name in service.list_trees().map_err(|err| err.to_string())? {
            println!("tree {name}");
        }
        return Ok(());
    };

    let tree = service.load_tree(tree_name).map_err(|err| err.to_string())?;
    let scene = render_scene(&tree, &LayoutConfig::default());
    println!("people={} lines={}", tree.people.len(), tree.lines.len());
    println!(
        "root={}",
        tree.root_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "connectors={} overlays={}",
        scene.connectors.len(),
        scene.overlays.len()
    );
    Ok(())
}
