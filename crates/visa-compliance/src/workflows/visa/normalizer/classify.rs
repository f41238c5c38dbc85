use super::super::domain::VisaType;

/// Ordered needle table; the first row with a hit wins.
const CLASSIFICATION_ORDER: [(&[&str], VisaType); 5] = [
    (&["visa free", "visa-free"], VisaType::VisaFree),
    (&["evisa", "e-visa", "electronic"], VisaType::Evisa),
    (&["on arrival", "voa"], VisaType::VisaOnArrival),
    (&["embassy", "consulate"], VisaType::EmbassyRequired),
    (&["transit"], VisaType::Transit),
];

/// Map a provider's free-form type/category strings onto the canonical visa type.
pub fn classify_visa_type(raw_type: &str, raw_category: &str) -> VisaType {
    let haystacks = [
        raw_category.to_ascii_lowercase(),
        raw_type.to_ascii_lowercase(),
    ];

    CLASSIFICATION_ORDER
        .iter()
        .find(|(needles, _)| {
            needles
                .iter()
                .any(|needle| haystacks.iter().any(|haystack| haystack.contains(needle)))
        })
        .map(|(_, visa_type)| *visa_type)
        .unwrap_or(VisaType::Other)
}
