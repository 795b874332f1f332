use std::time::Instant;

use seqletkit_core_rs::backend::Batched;
use seqletkit_core_rs::parallelism;
use seqletkit_core_rs::Track;
use seqletkit_seqlets_rs::Extractor;

const THREADS: isize = -1;
const EXAMPLES: usize = 20_000;
const POSITIONS: usize = 1_000;
const BATCH_SIZE: usize = 256;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

// Smooth background with a handful of sharp motifs per example
fn synthetic(examples: usize, positions: usize) -> Track<f32> {
    let mut values = Vec::with_capacity(examples * positions);
    for e in 0..examples {
        let phase = (e % 97) as f32 * 0.13;
        for p in 0..positions {
            let background = 0.05 * (p as f32 * 0.021 + phase).sin();
            let motif = match (p + e * 31) % 173 {
                0..=7 => 1.0 + (e % 11) as f32 * 0.1,
                _ => 0.0,
            };
            values.push(background + motif);
        }
    }
    Track::new(values, examples, positions).unwrap()
}

fn main() {
    let pool = parallelism::pool(THREADS).unwrap();
    let track = synthetic(EXAMPLES, POSITIONS);

    let mut backend = Batched::new();
    backend
        .set_batch_size(BATCH_SIZE)
        .unwrap()
        .set_progress_update(Some(EXAMPLES / 4))
        .unwrap();

    let mut extractor = Extractor::<f32>::new();
    extractor
        .set_max_seqlets_per_seq(10)
        .unwrap()
        .set_max_seqlets_total(50_000)
        .unwrap();

    let started = Instant::now();
    let result = {
        #[cfg(feature = "dhat-heap")]
        let _profiler = dhat::Profiler::new_heap();
        pool.install(|| extractor.run(&backend, &track)).unwrap()
    };
    let elapsed = started.elapsed();

    println!("Examples: {EXAMPLES} x {POSITIONS}");
    println!("Candidates: {}", result.vals_to_threshold().len());
    println!("Threshold: {}", result.thresholding().threshold());
    println!("Seqlets: {}", result.coords().len());
    for coords in result.coords().iter().take(5) {
        println!("\t{coords} score={}", coords.score());
    }
    println!("Elapsed: {:.2?}", elapsed);
}
