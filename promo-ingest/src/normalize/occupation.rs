//! Customer occupation classification

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{first_match, fold, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupation {
    CivilServant,
    PrivateEmployee,
    Laborer,
    Student,
    Homemaker,
    Unemployed,
}

impl Occupation {
    /// Stored label
    pub fn label(&self) -> &'static str {
        match self {
            Occupation::CivilServant => "PNS",
            Occupation::PrivateEmployee => "Karyawan Swasta",
            Occupation::Laborer => "Buruh",
            Occupation::Student => "Pelajar/Mahasiswa",
            Occupation::Homemaker => "Ibu Rumah Tangga",
            Occupation::Unemployed => "Tidak Bekerja",
        }
    }
}

impl fmt::Display for Occupation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// "pegawai negeri" must be tested before the generic "pegawai"
const OCCUPATION_RULES: &[Rule<Occupation>] = &[
    Rule::contains(&["pns", "asn", "pegawai negeri", "tni", "polri"], Occupation::CivilServant),
    Rule::contains(&["swasta", "karyawan", "pegawai"], Occupation::PrivateEmployee),
    Rule::contains(&["buruh", "petani", "nelayan", "tukang", "sopir", "ojek"], Occupation::Laborer),
    Rule::contains(&["pelajar", "mahasiswa", "siswa"], Occupation::Student),
    Rule::contains(&["ibu rumah tangga", "rumah tangga", "irt"], Occupation::Homemaker),
];

/// Blank or unmatched text is [`Occupation::Unemployed`]
pub fn classify_occupation(raw: Option<&str>) -> Occupation {
    let folded = raw.map(fold).unwrap_or_default();
    first_match(OCCUPATION_RULES, &folded).unwrap_or(Occupation::Unemployed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(classify_occupation(Some("PNS Guru")), Occupation::CivilServant);
        assert_eq!(classify_occupation(Some("Pegawai Negeri Sipil")), Occupation::CivilServant);
        assert_eq!(classify_occupation(Some("pegawai toko")), Occupation::PrivateEmployee);
        assert_eq!(classify_occupation(Some("Wiraswasta")), Occupation::PrivateEmployee);
        assert_eq!(classify_occupation(Some("Buruh Bangunan")), Occupation::Laborer);
        assert_eq!(classify_occupation(Some("Mahasiswi")), Occupation::Unemployed);
        assert_eq!(classify_occupation(Some("Mahasiswa")), Occupation::Student);
        assert_eq!(classify_occupation(Some("IRT")), Occupation::Homemaker);
    }

    #[test]
    fn test_blank_defaults_to_unemployed() {
        assert_eq!(classify_occupation(None), Occupation::Unemployed);
        assert_eq!(classify_occupation(Some("   ")), Occupation::Unemployed);
        assert_eq!(classify_occupation(Some("Pengusaha")), Occupation::Unemployed);
    }
}
