use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EDUCATION: [&str; 4] = ["Bachelor", "High School", "Master", "PhD"];
const CITIES: [&str; 3] = ["Chicago", "Houston", "Los Angeles"];

/// Deterministic mixed-type demo dataset as CSV text.
///
/// Columns: `age, income, salary, education, city, target`. `target` is a
/// binary label loosely driven by salary vs. income so that models have
/// something to learn.
pub fn generate_sample_csv(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::from("age,income,salary,education,city,target\n");

    for _ in 0..rows {
        let age: f64 = rng.random_range(25.0..50.0);
        let income: f64 = rng.random_range(30_000.0..100_000.0);
        let salary: f64 = rng.random_range(40_000.0..120_000.0);
        let education = EDUCATION[rng.random_range(0..EDUCATION.len())];
        let city = CITIES[rng.random_range(0..CITIES.len())];

        let noise: f64 = rng.random_range(-10_000.0..10_000.0);
        let target = u8::from(salary + noise > income + 10_000.0);

        out.push_str(&format!(
            "{age:.1},{income:.0},{salary:.0},{education},{city},{target}\n"
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{classify, ClassifiedContent};

    #[test]
    fn same_seed_same_data() {
        assert_eq!(generate_sample_csv(20, 7), generate_sample_csv(20, 7));
        assert_ne!(generate_sample_csv(20, 7), generate_sample_csv(20, 8));
    }

    #[test]
    fn sample_classifies_as_table() {
        match classify(&generate_sample_csv(30, 42)) {
            ClassifiedContent::Tabular(t) => {
                assert_eq!(t.n_rows(), 30);
                assert_eq!(t.n_cols(), 6);
            }
            other => panic!("expected table, got {}", other.kind()),
        }
    }
}
