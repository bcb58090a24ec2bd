use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use probe_hash::HashTable;
use probe_hash::hash_table::Entry;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Number of insert-then-remove cycles to run after filling the table.
    #[arg(long, default_value_t = 0)]
    churn: usize,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    let mut table: HashTable<u64> = HashTable::with_capacity(args.target_capacity);
    let initial_capacity = table.capacity();

    println!("Actual capacity: {}", initial_capacity);
    println!("Filling table with u64 values...");

    let mut resizes = 0;
    for i in 0..initial_capacity {
        let value = i as u64;
        let hash = hash_u64(value);
        let capacity = table.capacity();

        match table.entry(hash, |&v| v == value) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }

        if table.capacity() != capacity {
            resizes += 1;
        }
    }

    println!(
        "Inserted {} values into table ({} resizes, capacity {})",
        table.len(),
        resizes,
        table.capacity()
    );
    println!("Final load factor: {:.2}%", table.load_factor() * 100.0);

    table.probe_histogram().print();
    table.debug_stats().print();

    if args.churn == 0 {
        return;
    }

    // Each cycle inserts a fresh value and removes it again, so the live count
    // stays put while tombstones build up.
    let base = initial_capacity as u64;
    let capacity = table.capacity();
    for i in 0..args.churn as u64 {
        let value = base + i;
        let hash = hash_u64(value);
        table.entry(hash, |&v| v == value).or_insert(value);
        table.remove(hash, |&v| v == value);
    }

    println!();
    println!(
        "After {} churn cycles: {} live, {} tombstones, capacity {} -> {}",
        args.churn,
        table.len(),
        table.tombstones(),
        capacity,
        table.capacity()
    );
    table.probe_histogram().print();
    table.debug_stats().print();

    table.shrink_to_fit();
    println!();
    println!(
        "After shrink_to_fit: {} tombstones, capacity {}",
        table.tombstones(),
        table.capacity()
    );
    table.debug_stats().print();
}
