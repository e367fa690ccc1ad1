//! Keyword and slot based intent recognition for English and Arabic.

use chrono::{Days, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Recognised intent with its extracted slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Help,
    SearchServices {
        category: Option<String>,
        query: String,
    },
    BookService {
        service_query: String,
        date: Option<NaiveDate>,
        time: Option<NaiveTime>,
    },
    MyBookings,
    CancelBooking {
        booking_ref: Option<String>,
    },
    PaymentHelp,
    BecomeProvider,
    Unknown,
}

/// Slot-free intent label reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentName {
    Greeting,
    Help,
    SearchServices,
    BookService,
    MyBookings,
    CancelBooking,
    PaymentHelp,
    BecomeProvider,
    Unknown,
    /// The message never reached intent parsing.
    Refused,
}

impl Intent {
    /// Label of this intent.
    pub const fn name(&self) -> IntentName {
        match self {
            Self::Greeting => IntentName::Greeting,
            Self::Help => IntentName::Help,
            Self::SearchServices { .. } => IntentName::SearchServices,
            Self::BookService { .. } => IntentName::BookService,
            Self::MyBookings => IntentName::MyBookings,
            Self::CancelBooking { .. } => IntentName::CancelBooking,
            Self::PaymentHelp => IntentName::PaymentHelp,
            Self::BecomeProvider => IntentName::BecomeProvider,
            Self::Unknown => IntentName::Unknown,
        }
    }
}

/// Category slugs and the words that point at them.
const CATEGORY_LEXICON: &[(&str, &[&str])] = &[
    ("cleaning", &["clean", "cleaning", "cleaner", "maid", "تنظيف", "منظف"]),
    ("plumbing", &["plumber", "plumbing", "leak", "pipe", "سباك", "سباكة", "تسريب"]),
    ("electrical", &["electrician", "electrical", "wiring", "كهربائي", "كهرباء"]),
    ("carpentry", &["carpenter", "carpentry", "furniture", "نجار", "نجارة", "أثاث"]),
    ("painting", &["painter", "painting", "paint", "دهان", "طلاء"]),
    ("ac-repair", &["ac", "air conditioner", "air conditioning", "تكييف", "مكيف"]),
    ("moving", &["moving", "movers", "relocation", "نقل عفش", "نقل"]),
    ("tutoring", &["tutor", "tutoring", "lessons", "مدرس", "دروس"]),
    ("beauty", &["beauty", "salon", "haircut", "تجميل", "صالون"]),
];

/// Words stripped from the free-text part of a booking request.
const BOOKING_FILLER: &[&str] = &[
    "a", "an", "the", "me", "for", "on", "at", "please", "service", "appointment", "في", "لي",
    "الساعة", "موعد", "خدمة", "من", "فضلك", "يوم",
];

/// Compiled intent patterns.
#[derive(Debug, Clone)]
pub struct IntentParser {
    cancel: Regex,
    my_bookings: Regex,
    payment: Regex,
    become_provider: Regex,
    book: Regex,
    search: Regex,
    greeting: Regex,
    help: Regex,
    iso_date: Regex,
    today: Regex,
    tomorrow: Regex,
    clock_time: Regex,
    meridiem_time: Regex,
    booking_ref: Regex,
}

impl IntentParser {
    /// Compile the patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            cancel: Regex::new(r"(?i)\bcancel\w*\b|إلغاء|الغاء|ألغ|الغي")?,
            my_bookings: Regex::new(
                r"(?i)\bmy\s+(bookings?|appointments?|reservations?)\b|\bshow\s+(me\s+)?bookings\b|حجوزاتي|مواعيدي",
            )?,
            payment: Regex::new(
                r"(?i)\b(pay|paid|payment\w*|refund\w*|card|apple\s+pay|checkout|invoice)\b|دفع|الدفع|استرداد|بطاقة|فاتورة",
            )?,
            become_provider: Regex::new(
                r"(?i)\b(become|join\s+as|register\s+as|sign\s+up\s+as)\s+an?\s+provider\b|\bprovider\s+application\b|\boffer\s+my\s+services\b|(أصبح|اصبح|أصير|انضم\s+ك)\s*مقدم|التسجيل\s+كمقدم",
            )?,
            book: Regex::new(r"(?i)\b(book|reserve|schedule)\b\s*(?P<rest>.*)$|(احجز|حجز)\s*(?P<rest_ar>.*)$")?,
            search: Regex::new(
                r"(?i)\b(find|search(\s+for)?|looking\s+for|need|show(\s+me)?|any)\b\s*(?P<rest>.*)$|(ابحث\s+عن|أبحث\s+عن|أريد|اريد|أحتاج(\s+إلى)?|احتاج)\s*(?P<rest_ar>.*)$",
            )?,
            greeting: Regex::new(
                r"(?i)^\s*(hi|hello|hey|good\s+(morning|evening|afternoon)|salam|مرحبا|مرحباً|أهلا|اهلا|السلام\s+عليكم|صباح\s+الخير|مساء\s+الخير)\b",
            )?,
            help: Regex::new(r"(?i)\b(help|what\s+can\s+you\s+do|how\s+does\s+this\s+work)\b|مساعدة|ساعدني|ماذا\s+تستطيع")?,
            iso_date: Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b")?,
            today: Regex::new(r"(?i)\btoday\b|اليوم")?,
            tomorrow: Regex::new(r"(?i)\btomorrow\b|غداً|غدا|بكرة")?,
            clock_time: Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b")?,
            meridiem_time: Regex::new(r"(?i)\b(1[0-2]|0?[1-9])\s*(am|pm)\b")?,
            booking_ref: Regex::new(
                r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b|#(\w+)",
            )?,
        })
    }

    /// Classify `message`, resolving relative dates against `today`.
    pub fn parse(&self, message: &str, today: NaiveDate) -> Intent {
        let text = message.trim();
        if self.cancel.is_match(text) {
            return Intent::CancelBooking {
                booking_ref: self.booking_reference(text),
            };
        }
        if self.my_bookings.is_match(text) {
            return Intent::MyBookings;
        }
        if self.become_provider.is_match(text) {
            return Intent::BecomeProvider;
        }
        if self.payment.is_match(text) {
            return Intent::PaymentHelp;
        }
        if let Some(rest) = capture_rest(&self.book, text) {
            return self.booking(rest, today);
        }
        if let Some(rest) = capture_rest(&self.search, text) {
            return search(rest);
        }
        if self.greeting.is_match(text) {
            return Intent::Greeting;
        }
        if self.help.is_match(text) {
            return Intent::Help;
        }
        if let Some(category) = category_of(text) {
            return Intent::SearchServices {
                category: Some(category.to_owned()),
                query: category.to_owned(),
            };
        }
        Intent::Unknown
    }

    fn booking(&self, rest: &str, today: NaiveDate) -> Intent {
        let date = self.date(rest, today);
        let time = self.time(rest);
        let mut stripped = rest.to_owned();
        for pattern in [
            &self.iso_date,
            &self.today,
            &self.tomorrow,
            &self.clock_time,
            &self.meridiem_time,
        ] {
            stripped = pattern.replace_all(&stripped, " ").into_owned();
        }
        let service_query = stripped
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '?' | '!' | '،' | '؟'))
            .filter(|word| !word.is_empty())
            .filter(|word| !BOOKING_FILLER.contains(&word.to_lowercase().as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        Intent::BookService {
            service_query,
            date,
            time,
        }
    }

    fn date(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        if let Some(found) = self.iso_date.captures(text).and_then(|c| c.get(1)) {
            return NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").ok();
        }
        if self.tomorrow.is_match(text) {
            return today.checked_add_days(Days::new(1));
        }
        self.today.is_match(text).then_some(today)
    }

    fn time(&self, text: &str) -> Option<NaiveTime> {
        if let Some(caps) = self.clock_time.captures(text) {
            let hour = caps.get(1)?.as_str().parse().ok()?;
            let minute = caps.get(2)?.as_str().parse().ok()?;
            return NaiveTime::from_hms_opt(hour, minute, 0);
        }
        let caps = self.meridiem_time.captures(text)?;
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let pm = caps.get(2)?.as_str().eq_ignore_ascii_case("pm");
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        NaiveTime::from_hms_opt(hour, 0, 0)
    }

    fn booking_reference(&self, text: &str) -> Option<String> {
        let caps = self.booking_ref.captures(text)?;
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_owned())
    }
}

fn capture_rest<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    let caps = pattern.captures(text)?;
    let rest = caps
        .name("rest")
        .or_else(|| caps.name("rest_ar"))
        .map_or("", |m| m.as_str());
    Some(rest.trim())
}

fn search(rest: &str) -> Intent {
    let category = category_of(rest).map(str::to_owned);
    let query = rest
        .trim_start_matches(|c: char| c.is_whitespace())
        .trim_end_matches(['.', '?', '!', '؟'])
        .trim();
    let query = strip_article(query);
    let query = if query.is_empty() {
        category.clone().unwrap_or_default()
    } else {
        query.to_owned()
    };
    Intent::SearchServices { category, query }
}

fn strip_article(text: &str) -> &str {
    let lower = text.to_lowercase();
    for article in ["a ", "an ", "the ", "some "] {
        if lower.starts_with(article) {
            return text.get(article.len()..).unwrap_or(text).trim_start();
        }
    }
    text
}

/// First category whose vocabulary appears as a whole word (or, for Arabic,
/// as a substring, since Arabic attaches prefixes).
pub fn category_of(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    CATEGORY_LEXICON
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|keyword| {
                if keyword.is_ascii() {
                    if keyword.contains(' ') {
                        lower.contains(keyword)
                    } else {
                        words.contains(keyword)
                    }
                } else {
                    lower.contains(keyword)
                }
            })
        })
        .map(|(slug, _)| *slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn parser() -> IntentParser {
        IntentParser::new().expect("patterns compile")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
    }

    #[rstest]
    #[case("Hello!", IntentName::Greeting)]
    #[case("السلام عليكم", IntentName::Greeting)]
    #[case("help", IntentName::Help)]
    #[case("Show me my bookings", IntentName::MyBookings)]
    #[case("أريد رؤية حجوزاتي", IntentName::MyBookings)]
    #[case("How do I pay with apple pay?", IntentName::PaymentHelp)]
    #[case("I want to become a provider", IntentName::BecomeProvider)]
    #[case("كيف أصبح مقدم خدمة", IntentName::BecomeProvider)]
    #[case("cancel my booking", IntentName::CancelBooking)]
    #[case("what's the weather like", IntentName::Unknown)]
    fn classifies(parser: IntentParser, #[case] message: &str, #[case] expected: IntentName) {
        assert_eq!(parser.parse(message, today()).name(), expected);
    }

    #[rstest]
    fn search_extracts_category_and_query(parser: IntentParser) {
        let intent = parser.parse("I need a plumber for a leaking sink", today());
        assert_eq!(
            intent,
            Intent::SearchServices {
                category: Some("plumbing".to_owned()),
                query: "plumber for a leaking sink".to_owned(),
            }
        );
    }

    #[rstest]
    fn arabic_search_detects_category(parser: IntentParser) {
        let Intent::SearchServices { category, .. } = parser.parse("أبحث عن تنظيف منزل", today())
        else {
            panic!("expected a search intent");
        };
        assert_eq!(category.as_deref(), Some("cleaning"));
    }

    #[rstest]
    fn bare_category_mention_is_a_search(parser: IntentParser) {
        let intent = parser.parse("electrician", today());
        assert_eq!(intent.name(), IntentName::SearchServices);
    }

    #[rstest]
    #[case("Book a deep cleaning tomorrow at 5pm", "deep cleaning", Some((2026, 3, 15)), Some((17, 0)))]
    #[case("book plumbing on 2026-04-02 at 09:30", "plumbing", Some((2026, 4, 2)), Some((9, 30)))]
    #[case("schedule ac repair today", "ac repair", Some((2026, 3, 14)), None)]
    #[case("احجز تنظيف غدا الساعة 10:00", "تنظيف", Some((2026, 3, 15)), Some((10, 0)))]
    #[case("book a painter at 12am", "painter", None, Some((0, 0)))]
    fn booking_slots(
        parser: IntentParser,
        #[case] message: &str,
        #[case] query: &str,
        #[case] date: Option<(i32, u32, u32)>,
        #[case] time: Option<(u32, u32)>,
    ) {
        let expected = Intent::BookService {
            service_query: query.to_owned(),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            time: time.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
        };
        assert_eq!(parser.parse(message, today()), expected);
    }

    #[rstest]
    #[case("cancel booking #A12", Some("A12"))]
    #[case(
        "please cancel 3fa85f64-5717-4562-b3fc-2c963f66afa6",
        Some("3fa85f64-5717-4562-b3fc-2c963f66afa6")
    )]
    #[case("إلغاء الحجز", None)]
    fn cancellation_reference(
        parser: IntentParser,
        #[case] message: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            parser.parse(message, today()),
            Intent::CancelBooking {
                booking_ref: expected.map(str::to_owned)
            }
        );
    }
}
