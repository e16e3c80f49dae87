//! dpcompare Overlap Demo
//!
//! Compares two short fragments in every supported mode and prints the
//! resulting overlaps.

use dpcompare_core::{AlignContext, CompareMode, CompareParams, OverlapReport};

fn main() {
    println!("dpcompare Overlap Demo");
    println!("======================\n");

    // B starts 12 bases into A and carries one substitution
    let a = b"TTGACCATGGCAACGTACGGATCCTAGGCTTACGATCGGATCCATGCAAGTC";
    let b = b"ACGTACGGATCCTAGGCTTACCATCGGATCCATGCAAGTCGGTTACAGCAT";

    println!("A: {}", String::from_utf8_lossy(a));
    println!("B: {}\n", String::from_utf8_lossy(b));

    let mut ctx = AlignContext::new();
    for mode in [CompareMode::Overlap, CompareMode::Align, CompareMode::AffineAlign] {
        let params = CompareParams {
            erate: 0.1,
            minlen: 20,
            mode,
            ..CompareParams::full_range(a.len(), b.len())
        };

        println!("Mode: {}", mode);
        match ctx.compare(a, b, &params) {
            Ok(Some(overlap)) => {
                println!(
                    "  begin {} end {} diffs {} length {} ({:?})",
                    overlap.begin_offset,
                    overlap.end_offset,
                    overlap.diffs,
                    overlap.length,
                    overlap.kind()
                );
                if overlap.trace.is_some() {
                    print!("{}", OverlapReport::new(a, b, &overlap));
                }
            }
            Ok(None) => println!("  no overlap"),
            Err(e) => println!("Error: {}", e),
        }
        println!();
    }
}
