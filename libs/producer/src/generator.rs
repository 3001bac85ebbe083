use fake::Fake;
use fake::faker::address::en::StateName;
use fake::faker::name::en::Name;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sensor_api::{TelemetryRecord, now_ms};

/// Температура сэмплируется целым числом сотых долей градуса, чтобы
/// после деления на 100 оставалось ровно два знака.
const TEMPERATURE_CENTI_MIN: u16 = 3500;
const TEMPERATURE_CENTI_MAX: u16 = 4000;

/// Генератор синтетических показаний.
///
/// Владеет своим PRNG: у каждого producer'а независимый поток
/// случайности, общих данных между экземплярами нет.
pub struct RecordGenerator {
    rng: StdRng,
}

impl RecordGenerator {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    pub fn generate(&mut self, unit_id: &str) -> TelemetryRecord {
        let serial = uuid::Builder::from_random_bytes(self.rng.r#gen()).into_uuid();
        let centi = self.rng.gen_range(TEMPERATURE_CENTI_MIN..=TEMPERATURE_CENTI_MAX);

        TelemetryRecord {
            unit_id: unit_id.to_string(),
            serial_number: serial.to_string(),
            subject_name: Name().fake_with_rng(&mut self.rng),
            origin: StateName().fake_with_rng(&mut self.rng),
            timestamp_ms: now_ms(),
            temperature: f64::from(centi) / 100.0,
        }
    }

    /// The same stream also drives pacing, so one seed reproduces a whole run.
    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn temperature_in_range_with_two_decimals() {
        let mut g = RecordGenerator::seeded(1);
        for _ in 0..5000 {
            let t = g.generate("func-0").temperature;
            assert!((35.0..=40.0).contains(&t), "{t}");
            let scaled = t * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-9, "{t}");
        }
    }

    #[test]
    fn serial_numbers_are_distinct_uuids() {
        let mut g = RecordGenerator::from_entropy();
        let serials: HashSet<String> = (0..1000).map(|_| g.generate("func-0").serial_number).collect();
        assert_eq!(serials.len(), 1000);

        let any = serials.iter().next().unwrap();
        let parsed = uuid::Uuid::parse_str(any).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn fields_filled_in() {
        let mut g = RecordGenerator::seeded(3);
        let before = now_ms();
        let r = g.generate("func-4");
        assert_eq!(r.unit_id, "func-4");
        assert!(!r.subject_name.is_empty());
        assert!(!r.origin.is_empty());
        assert!(r.timestamp_ms >= before);
    }

    #[test]
    fn timestamps_do_not_go_backwards() {
        let mut g = RecordGenerator::seeded(5);
        let ts: Vec<i64> = (0..100).map(|_| g.generate("u").timestamp_ms).collect();
        assert!(ts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn same_seed_same_readings() {
        let mut a = RecordGenerator::seeded(99);
        let mut b = RecordGenerator::seeded(99);
        let (ra, rb) = (a.generate("u"), b.generate("u"));
        assert_eq!(ra.serial_number, rb.serial_number);
        assert_eq!(ra.subject_name, rb.subject_name);
        assert_eq!(ra.origin, rb.origin);
        assert_eq!(ra.temperature, rb.temperature);
    }
}
