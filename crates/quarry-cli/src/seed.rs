use quarry_core::models::NewSource;
use quarry_core::source::SourceType;

/// One sample board per supported ATS family.
pub fn sample_sources() -> Vec<NewSource> {
    vec![
        NewSource::new("Crypto.com", "https://jobs.lever.co/crypto")
            .with_declared_type(SourceType::Lever)
            .with_website("https://crypto.com")
            .with_description("Leading cryptocurrency platform"),
        NewSource::new("Fireblocks", "https://job-boards.greenhouse.io/fireblocks/")
            .with_declared_type(SourceType::Greenhouse)
            .with_website("https://fireblocks.com")
            .with_description("Digital asset custody and transfer platform"),
        NewSource::new("Chainalysis", "https://jobs.ashbyhq.com/chainalysis-careers")
            .with_declared_type(SourceType::Ashby)
            .with_website("https://chainalysis.com")
            .with_description("Blockchain data platform"),
        NewSource::new("Zero Hash", "https://zero-hash.breezy.hr/")
            .with_declared_type(SourceType::Breezy)
            .with_website("https://zerohash.com")
            .with_description("B2B crypto infrastructure"),
        NewSource::new("IO Global", "https://apply.workable.com/io-global/?lng=en")
            .with_declared_type(SourceType::Workable)
            .with_website("https://iohk.io")
            .with_description("Cardano blockchain development"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_sample_per_family_and_detectable() {
        let samples = sample_sources();
        let mut types: Vec<_> = samples.iter().filter_map(|s| s.declared_type).collect();
        types.sort();
        assert_eq!(types, SourceType::ALL.to_vec());

        for sample in &samples {
            assert_eq!(SourceType::detect(&sample.board_url), sample.declared_type);
        }
    }
}
