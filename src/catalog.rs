use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Bumped whenever an identifier is renamed or removed.
pub const CATALOG_VERSION: u32 = 1;

/// `value` is unique within its list but not across lists (`dreamy` is both a
/// location style and an expression), so lookups always take the field's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionEntry {
    pub value: &'static str,
    pub label: &'static str,
    pub icon: Option<&'static str>,
}

impl OptionEntry {
    const fn new(value: &'static str, label: &'static str) -> Self {
        OptionEntry {
            value,
            label,
            icon: None,
        }
    }

    const fn with_icon(value: &'static str, icon: &'static str, label: &'static str) -> Self {
        OptionEntry {
            value,
            label,
            icon: Some(icon),
        }
    }

    pub fn display_label(&self) -> String {
        match self.icon {
            Some(icon) => format!("{icon} {}", self.label),
            None => self.label.to_string(),
        }
    }
}

pub fn find_entry(list: &'static [OptionEntry], value: &str) -> Option<&'static OptionEntry> {
    list.iter().find(|entry| entry.value == value)
}

pub fn label_for(list: &'static [OptionEntry], value: &str) -> Option<&'static str> {
    find_entry(list, value).map(|entry| entry.label)
}

/// Labels of the selected ids, in catalog order. Unknown ids are skipped.
pub fn labels_in_catalog_order<'a, I>(list: &'static [OptionEntry], selected: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a String>,
{
    let selected: Vec<&str> = selected.into_iter().map(String::as_str).collect();
    list.iter()
        .filter(|entry| selected.contains(&entry.value))
        .map(|entry| entry.label)
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub name: &'static str,
    pub provinces: &'static [&'static str],
}

pub static REGIONS: &[Region] = &[
    Region {
        name: "Tây Bắc & Đông Bắc (Miền Bắc)",
        provinces: &[
            "Hà Giang", "Lào Cai", "Cao Bằng", "Yên Bái", "Sơn La", "Hòa Bình", "Bắc Kạn",
            "Lạng Sơn", "Điện Biên", "Lai Châu",
        ],
    },
    Region {
        name: "Đồng Bằng Sông Hồng & Duyên Hải (Miền Bắc)",
        provinces: &[
            "Hà Nội", "Quảng Ninh", "Hải Phòng", "Ninh Bình", "Bắc Ninh", "Nam Định", "Thái Bình",
            "Vĩnh Phúc",
        ],
    },
    Region {
        name: "Bắc Trung Bộ (Miền Trung)",
        provinces: &[
            "Thanh Hóa", "Nghệ An", "Hà Tĩnh", "Quảng Bình", "Quảng Trị", "Thừa Thiên Huế",
        ],
    },
    Region {
        name: "Duyên Hải Nam Trung Bộ (Miền Trung)",
        provinces: &[
            "Đà Nẵng", "Quảng Nam", "Quảng Ngãi", "Bình Định", "Phú Yên", "Khánh Hòa",
            "Ninh Thuận", "Bình Thuận",
        ],
    },
    Region {
        name: "Tây Nguyên",
        provinces: &["Lâm Đồng", "Đắk Lắk", "Gia Lai", "Kon Tum", "Đắk Nông"],
    },
    Region {
        name: "Đông Nam Bộ (Miền Nam)",
        provinces: &[
            "TP. Hồ Chí Minh", "Bà Rịa - Vũng Tàu", "Tây Ninh", "Đồng Nai", "Bình Dương",
        ],
    },
    Region {
        name: "Đồng Bằng Sông Cửu Long (Miền Tây)",
        provinces: &[
            "Cần Thơ", "Kiên Giang", "An Giang", "Tiền Giang", "Bến Tre", "Đồng Tháp", "Cà Mau",
            "Bạc Liêu", "Sóc Trăng",
        ],
    },
];

pub static LANDMARKS: &[(&str, &[&str])] = &[
    ("Hà Giang", &[
        "Cột cờ Lũng Cú", "Sông Nho Quế & Hẻm Tu Sản", "Đèo Mã Pí Lèng", "Nhà của Pao",
        "Ruộng bậc thang Hoàng Su Phì", "Phố cổ Đồng Văn", "Dinh thự Vua Mèo",
    ]),
    ("Lào Cai", &[
        "Đỉnh Fansipan", "Bản Cát Cát (Sapa)", "Nhà thờ đá Sapa", "Đèo Ô Quy Hồ",
        "Thung lũng Mường Hoa", "Y Tý - Biển mây",
    ]),
    ("Cao Bằng", &["Thác Bản Giốc", "Hang Pác Bó - Suối Lê Nin", "Động Ngườm Ngao", "Hồ Thang Hen"]),
    ("Yên Bái", &["Mù Cang Chải (Mùa lúa chín)", "Đèo Khau Phạ", "Suối Giàng", "Hồ Thác Bà"]),
    ("Sơn La", &["Đồi chè Trái Tim (Mộc Châu)", "Thác Dải Yếm", "Rừng thông Bản Áng", "Đỉnh Pha Luông"]),
    ("Hòa Bình", &["Thung lũng Mai Châu", "Thủy điện Hòa Bình", "Đèo Thung Khe", "Suối khoáng Kim Bôi"]),
    ("Bắc Kạn", &["Hồ Ba Bể", "Động Puông", "Ao Tiên"]),
    ("Lạng Sơn", &["Đỉnh Mẫu Sơn", "Ải Chi Lăng", "Thành nhà Mạc", "Động Tam Thanh"]),
    ("Điện Biên", &["Đèo Pha Đin", "Cánh đồng Mường Thanh", "Hồ Pá Khoang", "A Pa Chải"]),
    ("Lai Châu", &["Đèo Ô Quy Hồ", "Đỉnh Putaleng", "Cao nguyên Sìn Hồ"]),
    ("Hà Nội", &[
        "Hồ Gươm & Cầu Thê Húc", "Phố cổ Hà Nội", "Văn Miếu Quốc Tử Giám", "Hoàng thành Thăng Long",
        "Hồ Tây hoàng hôn", "Cầu Long Biên", "Nhà hát lớn",
    ]),
    ("Quảng Ninh", &[
        "Vịnh Hạ Long (Du thuyền)", "Đảo Cô Tô", "Yên Tử", "Bãi Cháy - Sun World",
        "Bảo tàng Quảng Ninh", "Vịnh Bái Tử Long",
    ]),
    ("Hải Phòng", &["Đảo Cát Bà", "Vịnh Lan Hạ", "Bãi biển Đồ Sơn", "Tuyệt Tình Cốc"]),
    ("Ninh Bình", &[
        "Tràng An", "Tam Cốc - Bích Động", "Hang Múa (View rồng)", "Chùa Bái Đính", "Cố đô Hoa Lư",
    ]),
    ("Bắc Ninh", &["Chùa Phật Tích", "Đền Đô", "Làng tranh Đông Hồ"]),
    ("Nam Định", &["Nhà thờ đổ Hải Lý", "Vườn quốc gia Xuân Thủy", "Phủ Dầy"]),
    ("Thái Bình", &["Biển Đồng Châu", "Biển Vô Cực (Quang Lang)", "Chùa Keo"]),
    ("Vĩnh Phúc", &["Tam Đảo (Nhà thờ đá)", "Hồ Đại Lải", "Thiền viện Trúc Lâm Tây Thiên"]),
    ("Thanh Hóa", &[
        "Pù Luông (Ruộng bậc thang)", "Biển Sầm Sơn", "Thành nhà Hồ", "Suối cá thần Cẩm Lương",
    ]),
    ("Nghệ An", &["Làng Sen quê Bác", "Biển Cửa Lò", "Đồi chè Thanh Chương", "Vườn quốc gia Pù Mát"]),
    ("Hà Tĩnh", &["Biển Thiên Cầm", "Ngã ba Đồng Lộc", "Hồ Kẻ Gỗ"]),
    ("Quảng Bình", &[
        "Động Phong Nha", "Động Thiên Đường", "Hang Sơn Đoòng", "Bãi biển Nhật Lệ", "Suối Moọc",
    ]),
    ("Quảng Trị", &["Thành cổ Quảng Trị", "Cầu Hiền Lương", "Địa đạo Vịnh Mốc"]),
    ("Thừa Thiên Huế", &[
        "Đại Nội Huế", "Lăng Khải Định", "Chùa Thiên Mụ", "Sông Hương - Cầu Tràng Tiền",
        "Lăng Minh Mạng",
    ]),
    ("Đà Nẵng", &[
        "Cầu Vàng (Bà Nà Hills)", "Biển Mỹ Khê", "Ngũ Hành Sơn", "Cầu Rồng (Phun lửa)",
        "Bán đảo Sơn Trà",
    ]),
    ("Quảng Nam", &["Phố cổ Hội An", "Thánh địa Mỹ Sơn", "Cù Lao Chàm", "Rừng dừa Bảy Mẫu"]),
    ("Quảng Ngãi", &["Đảo Lý Sơn", "Cổng Tò Vò", "Biển Mỹ Khê (Quảng Ngãi)"]),
    ("Bình Định", &["Eo Gió (Quy Nhơn)", "Kỳ Co", "Tháp Đôi", "Ghềnh Ráng Tiên Sa"]),
    ("Phú Yên", &["Gành Đá Đĩa", "Bãi Xép (Hoa vàng cỏ xanh)", "Mũi Điện", "Nhà thờ Mằng Lăng"]),
    ("Khánh Hòa", &["Biển Nha Trang", "Vinpearl Land", "Tháp Bà Ponagar", "Đảo Bình Ba", "Hòn Chồng"]),
    ("Ninh Thuận", &["Vịnh Vĩnh Hy", "Hang Rái", "Đồi cát Nam Cương", "Tháp Chàm Po Klong Garai"]),
    ("Bình Thuận", &["Mũi Né (Đồi cát bay)", "Bàu Trắng", "Hải đăng Kê Gà", "Đảo Phú Quý"]),
    ("Lâm Đồng", &[
        "Đà Lạt (Quảng trường Lâm Viên)", "Hồ Xuân Hương", "Thung lũng Tình Yêu", "Núi Langbiang",
        "Cổng trời Bali", "Săn mây Cầu Đất",
    ]),
    ("Đắk Lắk", &["Hồ Lắk", "Buôn Đôn", "Bảo tàng Thế giới Cà phê", "Thác Dray Nur"]),
    ("Gia Lai", &["Biển Hồ (Pleiku)", "Núi lửa Chư Đăng Ya", "Chùa Minh Thành"]),
    ("Kon Tum", &["Nhà thờ gỗ Kon Tum", "Cầu treo Kon Klor", "Ngã ba Đông Dương"]),
    ("Đắk Nông", &["Hồ Tà Đùng (Vịnh Hạ Long Tây Nguyên)", "Thác Liêng Nung"]),
    ("TP. Hồ Chí Minh", &[
        "Nhà thờ Đức Bà", "Bưu điện Thành phố", "Landmark 81", "Phố đi bộ Nguyễn Huệ",
        "Chợ Bến Thành", "Dinh Độc Lập",
    ]),
    ("Bà Rịa - Vũng Tàu", &[
        "Tượng Chúa Kitô Vua", "Hải đăng Vũng Tàu", "Biển Hồ Tràm", "Đồi Con Heo",
        "Mũi Nghinh Phong",
    ]),
    ("Tây Ninh", &["Núi Bà Đen (Đỉnh mây)", "Tòa Thánh Tây Ninh", "Hồ Dầu Tiếng"]),
    ("Đồng Nai", &["Khu du lịch Bửu Long", "Vườn quốc gia Nam Cát Tiên", "Thác Giang Điền"]),
    ("Bình Dương", &["Chùa Bà Thiên Hậu", "Khu du lịch Đại Nam", "Nhà thờ Phú Cường"]),
    ("Cần Thơ", &["Chợ nổi Cái Răng", "Bến Ninh Kiều", "Nhà cổ Bình Thủy", "Cồn Sơn"]),
    ("Kiên Giang", &[
        "Phú Quốc (Cầu Hôn)", "Grand World Phú Quốc", "Bãi Sao", "Quần đảo Nam Du", "Hà Tiên",
    ]),
    ("An Giang", &["Rừng tràm Trà Sư", "Miếu Bà Chúa Xứ", "Thất Sơn (Bảy Núi)", "Hồ Tà Pạ"]),
    ("Tiền Giang", &["Cù lao Thới Sơn", "Chùa Vĩnh Tràng", "Trại rắn Đồng Tâm"]),
    ("Bến Tre", &["Cồn Phụng", "Vườn trái cây Cái Mơn"]),
    ("Đồng Tháp", &["Làng hoa Sa Đéc", "Vườn quốc gia Tràm Chim", "Khu di tích Xẻo Quýt"]),
    ("Cà Mau", &["Mũi Cà Mau (Cột mốc)", "Rừng U Minh Hạ", "Chợ nổi Cà Mau"]),
    ("Bạc Liêu", &["Cánh đồng điện gió", "Nhà công tử Bạc Liêu", "Chùa Xiêm Cán"]),
    ("Sóc Trăng", &["Chùa Dơi", "Chùa Som Rông", "Chợ nổi Ngã Năm"]),
];

static LANDMARK_INDEX: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| LANDMARKS.iter().copied().collect());

pub fn provinces_in(region: &str) -> Option<&'static [&'static str]> {
    REGIONS
        .iter()
        .find(|entry| entry.name == region)
        .map(|entry| entry.provinces)
}

/// Landmarks of `province`; empty for an unknown province.
pub fn landmarks_for(province: &str) -> &'static [&'static str] {
    LANDMARK_INDEX.get(province).copied().unwrap_or(&[])
}

pub fn is_known_province(province: &str) -> bool {
    LANDMARK_INDEX.contains_key(province)
}

pub fn is_landmark_of(province: &str, landmark: &str) -> bool {
    landmarks_for(province).contains(&landmark)
}

pub static LOCATION_STYLES: &[OptionEntry] = &[
    OptionEntry::with_icon("realistic", "📸", "Thực tế"),
    OptionEntry::with_icon("cinematic", "🎬", "Điện ảnh"),
    OptionEntry::with_icon("vintage", "🎞️", "Cổ điển"),
    OptionEntry::with_icon("dreamy", "☁️", "Mộng mơ"),
    OptionEntry::with_icon("sunrise", "🌅", "Bình minh"),
    OptionEntry::with_icon("sunset", "🌇", "Hoàng hôn"),
];

pub static FEATURES: &[OptionEntry] = &[
    OptionEntry::with_icon("location_domestic", "🗺️", "Việt Nam"),
    OptionEntry::with_icon("location_world", "✈️", "Thế giới"),
    OptionEntry::with_icon("pose", "💃", "Dáng & Cử chỉ"),
    OptionEntry::with_icon("outfit", "👗", "Trang phục"),
    OptionEntry::with_icon("companion", "👫", "Ghép đôi"),
    OptionEntry::with_icon("add_ons", "🚲", "Thêm vật"),
    OptionEntry::with_icon("beautify_only", "✨", "Làm đẹp"),
];

pub static GENDERS: &[OptionEntry] = &[
    OptionEntry::new("auto", "Tự động"),
    OptionEntry::new("male", "Nam"),
    OptionEntry::new("female", "Nữ"),
];

pub static AGE_GROUPS: &[OptionEntry] = &[
    OptionEntry::new("auto", "Tự động"),
    OptionEntry::new("child", "Trẻ em (<12)"),
    OptionEntry::new("teen", "Thiếu niên (13-19)"),
    OptionEntry::new("young_adult", "Thanh niên (20-30)"),
    OptionEntry::new("adult", "Trung niên (31-50)"),
    OptionEntry::new("elderly", "Cao tuổi (50+)"),
];

pub static CLOTHING_LENGTHS: &[OptionEntry] = &[
    OptionEntry::new("auto", "Tự động"),
    OptionEntry::new("long", "Dài / Kín đáo"),
    OptionEntry::new("short", "Ngắn / Mát mẻ"),
];

pub static ACCESSORIES: &[OptionEntry] = &[
    OptionEntry::with_icon("hat", "👒", "Mũ/Nón"),
    OptionEntry::with_icon("glasses", "🕶️", "Kính râm"),
    OptionEntry::with_icon("shoes", "👟", "Sneaker"),
    OptionEntry::with_icon("high_heels", "👠", "Cao gót"),
    OptionEntry::with_icon("sandals", "👡", "Sandal"),
    OptionEntry::with_icon("scarf", "🧣", "Khăn quàng"),
    OptionEntry::with_icon("jewelry", "💍", "Trang sức"),
    OptionEntry::with_icon("bag", "👜", "Túi xách"),
    OptionEntry::with_icon("camera", "📷", "Máy ảnh"),
];

pub static WEATHER: &[OptionEntry] = &[
    OptionEntry::with_icon("sunny", "☀️", "Nắng đẹp"),
    OptionEntry::with_icon("cloudy", "☁️", "Nhiều mây"),
    OptionEntry::with_icon("rainy", "🌧️", "Mưa"),
    OptionEntry::with_icon("stormy", "⛈️", "Bão/Giông"),
    OptionEntry::with_icon("windy", "🍃", "Gió mạnh"),
    OptionEntry::with_icon("snowy", "❄️", "Tuyết rơi"),
    OptionEntry::with_icon("gloomy", "🌫️", "Âm u/Sương mù"),
    OptionEntry::with_icon("icy", "🧊", "Băng giá"),
    OptionEntry::with_icon("rainbow", "🌈", "Cầu vồng"),
    OptionEntry::with_icon("starry", "✨", "Đêm đầy sao"),
    OptionEntry::with_icon("aurora", "🌌", "Cực quang"),
];

pub static BACKGROUND_DETAILS: &[OptionEntry] = &[
    OptionEntry::with_icon("flowers", "🌸", "Hoa & Cây cảnh"),
    OptionEntry::with_icon("animals", "🕊️", "Động vật"),
    OptionEntry::with_icon("crowd", "👥", "Người tham quan (Mờ)"),
    OptionEntry::with_icon("street_vendors", "🏪", "Quán xá/Cửa tiệm"),
    OptionEntry::with_icon("fireworks", "🎆", "Pháo hoa"),
    OptionEntry::with_icon("lanterns", "🏮", "Đèn lồng"),
    OptionEntry::with_icon("balloons", "🎈", "Bóng bay"),
    OptionEntry::with_icon("autumn_leaves", "🍂", "Lá thu rơi"),
    OptionEntry::with_icon("cherry_blossom", "🌸", "Hoa anh đào rơi"),
];

pub static EXPRESSIONS: &[OptionEntry] = &[
    OptionEntry::with_icon("smiling_naturally", "😊", "Cười tự nhiên"),
    OptionEntry::with_icon("laughing_happily", "😆", "Cười tươi / Vui vẻ"),
    OptionEntry::with_icon("cool_confident", "😎", "Ngầu / Lạnh lùng"),
    OptionEntry::with_icon("thoughtful", "🤔", "Suy tư / Deep"),
    OptionEntry::with_icon("dreamy", "😌", "Mơ màng"),
    OptionEntry::with_icon("surprised", "😲", "Ngạc nhiên"),
    OptionEntry::with_icon("winking", "😉", "Nháy mắt"),
];

pub static BEAUTIFY_LEVELS: &[OptionEntry] = &[
    OptionEntry::new("off", "Tắt"),
    OptionEntry::new("light", "Nhẹ"),
    OptionEntry::new("medium", "Vừa"),
    OptionEntry::new("high", "Cao"),
];

pub static OUTPUT_STYLES: &[OptionEntry] = &[
    OptionEntry::new("photorealistic", "Ảnh thật (Photorealistic)"),
    OptionEntry::new("cinematic", "Điện ảnh (Cinematic)"),
    OptionEntry::new("magazine", "Tạp chí (Magazine)"),
    OptionEntry::new("travel_blog", "Travel Blog"),
    OptionEntry::new("anime", "Anime / Hoạt hình"),
    OptionEntry::new("vintage_film", "Phim nhựa (Vintage Film)"),
    OptionEntry::new("cyberpunk", "Cyberpunk / Tương lai"),
    OptionEntry::new("oil_painting", "Tranh sơn dầu"),
];

pub static ASPECT_RATIOS: &[OptionEntry] = &[
    OptionEntry::new("1:1", "1:1 (Vuông - Instagram)"),
    OptionEntry::new("9:16", "9:16 (Dọc - TikTok/Story)"),
    OptionEntry::new("3:4", "3:4 (Dọc - Phổ biến)"),
    OptionEntry::new("4:5", "4:5 (Dọc - Facebook)"),
    OptionEntry::new("2:3", "2:3 (Dọc - Tiêu chuẩn)"),
    OptionEntry::new("16:9", "16:9 (Ngang - YouTube)"),
    OptionEntry::new("4:3", "4:3 (Ngang - TV/Màn hình)"),
    OptionEntry::new("3:2", "3:2 (Ngang - DSLR)"),
    OptionEntry::new("21:9", "21:9 (Ngang - Điện ảnh)"),
];

pub static POSE_SUGGESTIONS: &[&str] = &[
    "Giơ tay chữ V (Peace sign)",
    "Bắn tim (Heart finger)",
    "Khoanh tay trước ngực",
    "Đang bước đi tự nhiên",
    "Vuốt tóc nhẹ nhàng",
    "Cầm ly cà phê",
    "Ngồi thư giãn",
    "Nhìn xa xăm",
];

macro_rules! catalog_enum {
    ($name:ident, $list:ident, { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn value(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn from_value(value: &str) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn label(self) -> &'static str {
                label_for($list, self.value()).unwrap_or(self.value())
            }
        }
    };
}

catalog_enum!(Gender, GENDERS, {
    Auto => "auto",
    Male => "male",
    Female => "female",
});

catalog_enum!(AgeGroup, AGE_GROUPS, {
    Auto => "auto",
    Child => "child",
    Teen => "teen",
    YoungAdult => "young_adult",
    Adult => "adult",
    Elderly => "elderly",
});

catalog_enum!(ClothingLength, CLOTHING_LENGTHS, {
    Auto => "auto",
    Long => "long",
    Short => "short",
});

catalog_enum!(BeautifyLevel, BEAUTIFY_LEVELS, {
    Off => "off",
    Light => "light",
    Medium => "medium",
    High => "high",
});

catalog_enum!(OutputStyle, OUTPUT_STYLES, {
    Photorealistic => "photorealistic",
    Cinematic => "cinematic",
    Magazine => "magazine",
    TravelBlog => "travel_blog",
    Anime => "anime",
    VintageFilm => "vintage_film",
    Cyberpunk => "cyberpunk",
    OilPainting => "oil_painting",
});

catalog_enum!(AspectRatio, ASPECT_RATIOS, {
    Square => "1:1",
    Portrait9x16 => "9:16",
    Portrait3x4 => "3:4",
    Portrait4x5 => "4:5",
    Portrait2x3 => "2:3",
    Landscape16x9 => "16:9",
    Landscape4x3 => "4:3",
    Landscape3x2 => "3:2",
    Landscape21x9 => "21:9",
});

impl Default for ClothingLength {
    fn default() -> Self {
        ClothingLength::Auto
    }
}

/// The only ratios the image model accepts as a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectBucket {
    Square,
    Widescreen,
    Portrait,
}

impl AspectBucket {
    pub fn value(self) -> &'static str {
        match self {
            AspectBucket::Square => "1:1",
            AspectBucket::Widescreen => "16:9",
            AspectBucket::Portrait => "3:4",
        }
    }
}

impl AspectRatio {
    pub fn dimensions(self) -> (u32, u32) {
        let (width, height) = self.value().split_once(':').unwrap_or(("1", "1"));
        (width.parse().unwrap_or(1), height.parse().unwrap_or(1))
    }

    /// Lossy: the ratio is reduced to its orientation.
    pub fn bucket(self) -> AspectBucket {
        let (width, height) = self.dimensions();
        match width.cmp(&height) {
            std::cmp::Ordering::Equal => AspectBucket::Square,
            std::cmp::Ordering::Greater => AspectBucket::Widescreen,
            std::cmp::Ordering::Less => AspectBucket::Portrait,
        }
    }

    pub fn is_degraded(self) -> bool {
        self.value() != self.bucket().value()
    }
}
