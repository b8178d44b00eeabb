use std::sync::Arc;

use robos_pathfinder::{
    GridPoint, MemorySink, PathSearch, SearchConfig, SearchState, create_grid, find_path,
    toggle_tile,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("A* Grid Pathfinding Example");
    println!("===========================");

    let mut grid = create_grid(10, 8)?;

    // Wall with one gap at the bottom
    for y in 0..7 {
        toggle_tile(&mut grid, 4, y, true);
    }
    // A few scattered rocks
    for (x, y) in [(7, 2), (7, 3), (8, 5), (1, 4)] {
        toggle_tile(&mut grid, x, y, true);
    }

    println!("\nGrid layout ({}):", grid);
    print!("{}", grid.render_with_path(&[]));

    // Simple interface
    println!("\nfind_path (0, 0) -> (9, 0):");
    match find_path(&mut grid, 0, 0, 9, 0)? {
        Some(path) => println!("  {} cells: {:?}", path.len(), path),
        None => println!("  No path found!"),
    }

    // Step-by-step search with diagnostics captured in memory
    let sink = Arc::new(MemorySink::new());
    grid.set_sink(sink.clone());

    let start = GridPoint::new(0, 0);
    let target = GridPoint::new(9, 0);
    let mut search = PathSearch::with_config(&mut grid, SearchConfig::default())?;
    search.begin(start, target)?;

    let mut steps = 0;
    while search.step() == SearchState::Running {
        steps += 1;
    }
    println!(
        "\nStepped search finished as {:?} after {} steps ({} still open, {} closed)",
        search.state(),
        steps,
        search.open_set().len(),
        search.closed_set().len()
    );

    let path = search.reconstruct()?;
    println!("Path visualization:");
    print!("{}", search.grid().render_with_path(&path));
    println!("{} debug records captured", sink.records().len());

    // Same query, 4-connected
    let result = PathSearch::with_config(&mut grid, SearchConfig::four_connected())?.run(start, target)?;
    println!("\n4-connected: {}", result);

    // Unreachable target
    println!("\n{}", "=".repeat(40));
    println!("Testing blocked scenario...");
    toggle_tile(&mut grid, 4, 7, true);
    let blocked = PathSearch::new(&mut grid).run(start, target)?;
    println!("Blocked scenario result: {}", blocked);

    Ok(())
}
