use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Course {
    #[serde(rename = "BCA")]
    Bca,
    #[serde(rename = "BCOM")]
    Bcom,
    #[serde(rename = "BBA")]
    Bba,
}

impl Course {
    pub const ALL: [Course; 3] = [Course::Bca, Course::Bcom, Course::Bba];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == s)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Bca => "BCA",
            Self::Bcom => "BCOM",
            Self::Bba => "BBA",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Bca => "Bachelor of Computer Applications",
            Self::Bcom => "Bachelor of Commerce",
            Self::Bba => "Bachelor of Business Administration",
        }
    }

    /// Seats across all three years.
    pub fn capacity(self) -> u32 {
        match self {
            Self::Bca => 240,
            Self::Bcom => 360,
            Self::Bba => 180,
        }
    }

    /// Students per year: a third of capacity, rounded down.
    pub fn roster_size(self) -> u32 {
        self.capacity() / 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Year {
    #[serde(rename = "1st Year")]
    First,
    #[serde(rename = "2nd Year")]
    Second,
    #[serde(rename = "3rd Year")]
    Third,
}

impl Year {
    pub const ALL: [Year; 3] = [Year::First, Year::Second, Year::Third];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|y| y.label() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "1st Year",
            Self::Second => "2nd Year",
            Self::Third => "3rd Year",
        }
    }

    pub fn digit(self) -> char {
        match self {
            Self::First => '1',
            Self::Second => '2',
            Self::Third => '3',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub uucms_no: String,
    pub name: String,
    pub course: Course,
    pub year: Year,
}

/// Source of the student list for a course/year. The synthetic generator is
/// the only implementation today; a student-information-system client would
/// slot in here.
pub trait StudentDirectory {
    fn list_students(&self, course: Course, year: Year) -> Vec<Student>;
}

/// Generates `<course><yearDigit><seq>` identifiers, `seq` zero-padded to
/// three digits and starting at 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticDirectory;

impl StudentDirectory for SyntheticDirectory {
    fn list_students(&self, course: Course, year: Year) -> Vec<Student> {
        (1..=course.roster_size())
            .map(|i| {
                let seq = format!("{i:03}");
                Student {
                    uucms_no: format!("{}{}{}", course.code(), year.digit(), seq),
                    name: format!("Student {}-{}-{}", course.code(), year.digit(), seq),
                    course,
                    year,
                }
            })
            .collect()
    }
}

/// Case-insensitive substring match on name or UUCMS number. A blank query
/// keeps everything.
pub fn filter_students(students: Vec<Student>, query: &str) -> Vec<Student> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return students;
    }
    students
        .into_iter()
        .filter(|s| s.name.to_lowercase().contains(&q) || s.uucms_no.to_lowercase().contains(&q))
        .collect()
}
