use std::sync::Arc;

use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (channel, negative-cluster mean, positive-cluster mean)
const CHANNELS: [(&str, f64, f64); 5] = [
    ("FAM", 1200.0, 7800.0),
    ("VIC", 900.0, 5600.0),
    ("ABY", 1500.0, 6900.0),
    ("JUN", 700.0, 4300.0),
    ("ROX", 3000.0, 3000.0),
];

struct Row {
    run: String,
    sample: String,
    index: i64,
    reject: bool,
    channel: String,
    c40: f64,
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let run = "Run_2024_03_14";
    // (sample, partitions, positive fraction per channel, channels measured)
    let samples: [(&str, i64, f64, usize); 4] = [
        ("A1", 2000, 0.15, 5),
        ("A2", 2000, 0.40, 5),
        ("B1", 1500, 0.05, 4),
        ("NTC", 800, 0.0, 3),
    ];

    let mut rows = Vec::new();
    for &(sample, partitions, positive_fraction, n_channels) in &samples {
        for index in 1..=partitions {
            for &(channel, neg, pos) in &CHANNELS[..n_channels] {
                let positive = rng.next_f64() < positive_fraction;
                let mean = if positive { pos } else { neg };
                rows.push(Row {
                    run: run.to_string(),
                    sample: sample.to_string(),
                    index,
                    reject: rng.next_f64() < 0.02,
                    channel: channel.to_string(),
                    c40: rng.gauss(mean, mean * 0.06),
                });
            }
        }
    }

    // CSV
    let csv_path = "sample_partitions.csv";
    let mut writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV file");
    writer
        .write_record(["Run", "Sample", "Index", "Reject", "Channel", "C40"])
        .expect("Failed to write CSV header");
    for row in &rows {
        writer
            .write_record([
                row.run.clone(),
                row.sample.clone(),
                row.index.to_string(),
                if row.reject { "True" } else { "False" }.to_string(),
                row.channel.clone(),
                format!("{:.3}", row.c40),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV file");

    // Parquet
    let schema = Arc::new(Schema::new(vec![
        Field::new("Run", DataType::Utf8, false),
        Field::new("Sample", DataType::Utf8, false),
        Field::new("Index", DataType::Int64, false),
        Field::new("Reject", DataType::Boolean, false),
        Field::new("Channel", DataType::Utf8, false),
        Field::new("C40", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.run.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.sample.as_str()))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.index))),
            Arc::new(BooleanArray::from(rows.iter().map(|r| r.reject).collect::<Vec<_>>())),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.channel.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.c40))),
        ],
    )
    .expect("Failed to create RecordBatch");

    let parquet_path = "sample_partitions.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} readings for {} samples to {csv_path} and {parquet_path}",
        rows.len(),
        samples.len()
    );
}
