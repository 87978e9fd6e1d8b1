//! Site Resolution
//!
//! TigerStyle: Closed set of bank sites, static region table, total lookup.
//!
//! The host only tells us where the player is standing. A bank site is
//! identified by the map region the player occupies when the bank opens.
//! Anything not in the table resolves to [`Site::Unknown`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Number of named sites (excluding [`Site::Unknown`])
pub const SITES_NAMED_COUNT: usize = 88;

/// Number of entries in the region table
pub const REGION_TABLE_LEN: usize = 87;

/// Tiles per region edge, as a shift
const REGION_SHIFT: u32 = 6;

// =============================================================================
// Types
// =============================================================================

/// A physical bank location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Site {
    Lumbridge,
    VarrockWest,
    VarrockEast,
    FaladorEast,
    FaladorWest,
    GrandExchange,
    AlKharid,
    EmirsArena,
    Nardah,
    RuinsOfUnkah,
    ShantayPass,
    TutorialIsland,
    TheNode,
    DraynorVillage,
    Edgeville,
    Canifis,
    PortPhasmatys,
    Darkmeyer,
    VerSinhaza,
    BurgDeRott,
    MosLeHarmless,
    TroubleBrewing,
    FossilIslandMuseumCamp,
    VolcanicMine,
    FossilIslandSmallIsland,
    ThePandemonium,
    TheGreatConch,
    ApeAtoll,
    ShiloVillage,
    CraftingGuild,
    PortKhazard,
    ArdougneSouth,
    ArdougneNorth,
    FishingGuild,
    Catherby,
    RougesDen,
    SeersVillage,
    Etceteria,
    Jatizso,
    Neitiznot,
    LunarIsle,
    PiscatorisFishingColony,
    TreeGnomeStronghold,
    GrandTree,
    BarbarianOutpost,
    CastleWars,
    Yanille,
    CorsairCove,
    MythsGuild,
    VoidKnightsOutpost,
    SoulWarsLobby,
    Lletya,
    InstancedLleytya,
    PrifddinasSouthEast,
    PrifddinasNorthWest,
    Zanaris,
    MageArenaBank,
    Camdozaal,
    FightCaves,
    MorUlRek,
    PortPiscarilius,
    Arceuus,
    KourendCastle,
    Hosidius,
    HosidiusVinery,
    HosidiusKitchen,
    WoodcuttingGuild,
    Shayzien,
    LandsEnd,
    Lovakengj,
    LovakengjMine,
    BlastMine,
    Wintertodt,
    MountKaruulm,
    FarmingGuild,
    MountQuiidamortem,
    Auburnvale,
    NemusRetreat,
    TalTeklan,
    Aldarin,
    Mistrock,
    HunterGuild,
    CivitasIllaFortisWest,
    CivitasIllaFortisEast,
    QuetzacalliGorge,
    TheDarkfrost,
    FeroxEnclave,
    MotherlodeMine,
    /// Not a known bank, or no position available
    Unknown,
}

/// Opaque location key handed to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

/// A tile position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub plane: u8,
}

impl WorldPoint {
    pub fn new(x: u32, y: u32, plane: u8) -> Self {
        Self { x, y, plane }
    }

    /// Region containing this tile. Regions are 64x64 tiles.
    pub fn region_id(&self) -> RegionId {
        RegionId(((self.x >> REGION_SHIFT) << 8) | (self.y >> REGION_SHIFT))
    }
}

// =============================================================================
// Region Table
// =============================================================================

/// Region id to bank site.
const REGION_TABLE: [(u32, Site); REGION_TABLE_LEN] = [
    (12850, Site::Lumbridge),
    (12597, Site::VarrockWest),
    (12853, Site::VarrockEast),
    (11828, Site::FaladorEast),
    (12084, Site::FaladorWest),
    (12598, Site::GrandExchange),
    (13105, Site::AlKharid),
    (13363, Site::EmirsArena),
    (13613, Site::Nardah),
    (12588, Site::RuinsOfUnkah),
    (13104, Site::ShantayPass),
    (12336, Site::TutorialIsland),
    (12335, Site::TheNode),
    (12338, Site::DraynorVillage),
    (12342, Site::Edgeville),
    (13878, Site::Canifis),
    (14646, Site::PortPhasmatys),
    (14388, Site::Darkmeyer),
    (14386, Site::VerSinhaza),
    (13874, Site::BurgDeRott),
    (14638, Site::MosLeHarmless),
    (15151, Site::TroubleBrewing),
    (14907, Site::FossilIslandMuseumCamp),
    (15163, Site::VolcanicMine),
    (14908, Site::FossilIslandSmallIsland),
    (12078, Site::ThePandemonium),
    (12581, Site::TheGreatConch),
    (11051, Site::ApeAtoll),
    (11310, Site::ShiloVillage),
    (11571, Site::CraftingGuild),
    (10545, Site::PortKhazard),
    (10547, Site::ArdougneSouth),
    (10292, Site::ArdougneNorth),
    (10293, Site::FishingGuild),
    (11061, Site::Catherby),
    (11575, Site::RougesDen),
    (10806, Site::SeersVillage),
    (10300, Site::Etceteria),
    (9531, Site::Jatizso),
    (9275, Site::Neitiznot),
    (8253, Site::LunarIsle),
    (9273, Site::PiscatorisFishingColony),
    (9781, Site::TreeGnomeStronghold),
    (9782, Site::GrandTree),
    (10039, Site::BarbarianOutpost),
    (9776, Site::CastleWars),
    (10288, Site::Yanille),
    (10284, Site::CorsairCove),
    (9772, Site::MythsGuild),
    (10537, Site::VoidKnightsOutpost),
    (8748, Site::SoulWarsLobby),
    (9265, Site::Lletya),
    (9011, Site::PrifddinasSouthEast),
    (12895, Site::PrifddinasNorthWest),
    (9541, Site::Zanaris),
    (10057, Site::MageArenaBank),
    (11866, Site::Camdozaal),
    (9808, Site::FightCaves),
    (10064, Site::MorUlRek),
    (7227, Site::PortPiscarilius),
    (6458, Site::Arceuus),
    (6457, Site::KourendCastle),
    (6968, Site::Hosidius),
    (7223, Site::HosidiusVinery),
    (6712, Site::HosidiusKitchen),
    (6198, Site::WoodcuttingGuild),
    (5944, Site::Shayzien),
    (5941, Site::LandsEnd),
    (5946, Site::Lovakengj),
    (5691, Site::LovakengjMine),
    (5948, Site::BlastMine),
    (6461, Site::Wintertodt),
    (5179, Site::MountKaruulm),
    (4922, Site::FarmingGuild),
    (4919, Site::MountQuiidamortem),
    (5428, Site::Auburnvale),
    (4912, Site::TalTeklan),
    (5421, Site::Aldarin),
    (5420, Site::Mistrock),
    (6191, Site::HunterGuild),
    (6448, Site::CivitasIllaFortisWest),
    (6960, Site::CivitasIllaFortisEast),
    (5938, Site::QuetzacalliGorge),
    (5939, Site::TheDarkfrost),
    (5427, Site::NemusRetreat),
    (12344, Site::FeroxEnclave),
    (14936, Site::MotherlodeMine),
];

static REGION_INDEX: Lazy<HashMap<u32, Site>> =
    Lazy::new(|| REGION_TABLE.iter().copied().collect());

static NAME_INDEX: Lazy<HashMap<&'static str, Site>> =
    Lazy::new(|| Site::ALL.iter().map(|site| (site.as_str(), *site)).collect());

// =============================================================================
// Resolution
// =============================================================================

/// Maps a position key to a site.
///
/// Implementations must be total: absent or unrecognised keys yield
/// [`Site::Unknown`], never an error.
pub trait SiteResolver {
    fn resolve(&self, key: Option<RegionId>) -> Site;

    /// Resolve from a world position
    fn resolve_point(&self, point: Option<WorldPoint>) -> Site {
        self.resolve(point.map(|p| p.region_id()))
    }
}

/// The built-in region table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionTable;

impl SiteResolver for RegionTable {
    fn resolve(&self, key: Option<RegionId>) -> Site {
        resolve(key)
    }
}

/// Resolve a region key against the static table.
pub fn resolve(key: Option<RegionId>) -> Site {
    key.and_then(|RegionId(region)| REGION_INDEX.get(&region).copied())
        .unwrap_or(Site::Unknown)
}

impl Site {
    /// Every site, in declaration order, `Unknown` last.
    pub const ALL: [Site; SITES_NAMED_COUNT + 1] = [
        Site::Lumbridge,
        Site::VarrockWest,
        Site::VarrockEast,
        Site::FaladorEast,
        Site::FaladorWest,
        Site::GrandExchange,
        Site::AlKharid,
        Site::EmirsArena,
        Site::Nardah,
        Site::RuinsOfUnkah,
        Site::ShantayPass,
        Site::TutorialIsland,
        Site::TheNode,
        Site::DraynorVillage,
        Site::Edgeville,
        Site::Canifis,
        Site::PortPhasmatys,
        Site::Darkmeyer,
        Site::VerSinhaza,
        Site::BurgDeRott,
        Site::MosLeHarmless,
        Site::TroubleBrewing,
        Site::FossilIslandMuseumCamp,
        Site::VolcanicMine,
        Site::FossilIslandSmallIsland,
        Site::ThePandemonium,
        Site::TheGreatConch,
        Site::ApeAtoll,
        Site::ShiloVillage,
        Site::CraftingGuild,
        Site::PortKhazard,
        Site::ArdougneSouth,
        Site::ArdougneNorth,
        Site::FishingGuild,
        Site::Catherby,
        Site::RougesDen,
        Site::SeersVillage,
        Site::Etceteria,
        Site::Jatizso,
        Site::Neitiznot,
        Site::LunarIsle,
        Site::PiscatorisFishingColony,
        Site::TreeGnomeStronghold,
        Site::GrandTree,
        Site::BarbarianOutpost,
        Site::CastleWars,
        Site::Yanille,
        Site::CorsairCove,
        Site::MythsGuild,
        Site::VoidKnightsOutpost,
        Site::SoulWarsLobby,
        Site::Lletya,
        Site::InstancedLleytya,
        Site::PrifddinasSouthEast,
        Site::PrifddinasNorthWest,
        Site::Zanaris,
        Site::MageArenaBank,
        Site::Camdozaal,
        Site::FightCaves,
        Site::MorUlRek,
        Site::PortPiscarilius,
        Site::Arceuus,
        Site::KourendCastle,
        Site::Hosidius,
        Site::HosidiusVinery,
        Site::HosidiusKitchen,
        Site::WoodcuttingGuild,
        Site::Shayzien,
        Site::LandsEnd,
        Site::Lovakengj,
        Site::LovakengjMine,
        Site::BlastMine,
        Site::Wintertodt,
        Site::MountKaruulm,
        Site::FarmingGuild,
        Site::MountQuiidamortem,
        Site::Auburnvale,
        Site::NemusRetreat,
        Site::TalTeklan,
        Site::Aldarin,
        Site::Mistrock,
        Site::HunterGuild,
        Site::CivitasIllaFortisWest,
        Site::CivitasIllaFortisEast,
        Site::QuetzacalliGorge,
        Site::TheDarkfrost,
        Site::FeroxEnclave,
        Site::MotherlodeMine,
        Site::Unknown,
    ];

    /// Persisted name, e.g. `VARROCK_WEST`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lumbridge => "LUMBRIDGE",
            Self::VarrockWest => "VARROCK_WEST",
            Self::VarrockEast => "VARROCK_EAST",
            Self::FaladorEast => "FALADOR_EAST",
            Self::FaladorWest => "FALADOR_WEST",
            Self::GrandExchange => "GRAND_EXCHANGE",
            Self::AlKharid => "AL_KHARID",
            Self::EmirsArena => "EMIRS_ARENA",
            Self::Nardah => "NARDAH",
            Self::RuinsOfUnkah => "RUINS_OF_UNKAH",
            Self::ShantayPass => "SHANTAY_PASS",
            Self::TutorialIsland => "TUTORIAL_ISLAND",
            Self::TheNode => "THE_NODE",
            Self::DraynorVillage => "DRAYNOR_VILLAGE",
            Self::Edgeville => "EDGEVILLE",
            Self::Canifis => "CANIFIS",
            Self::PortPhasmatys => "PORT_PHASMATYS",
            Self::Darkmeyer => "DARKMEYER",
            Self::VerSinhaza => "VER_SINHAZA",
            Self::BurgDeRott => "BURG_DE_ROTT",
            Self::MosLeHarmless => "MOS_LE_HARMLESS",
            Self::TroubleBrewing => "TROUBLE_BREWING",
            Self::FossilIslandMuseumCamp => "FOSSIL_ISLAND_MUSEUM_CAMP",
            Self::VolcanicMine => "VOLCANIC_MINE",
            Self::FossilIslandSmallIsland => "FOSSIL_ISLAND_SMALL_ISLAND",
            Self::ThePandemonium => "THE_PANDEMONIUM",
            Self::TheGreatConch => "THE_GREAT_CONCH",
            Self::ApeAtoll => "APE_ATOLL",
            Self::ShiloVillage => "SHILO_VILLAGE",
            Self::CraftingGuild => "CRAFTING_GUILD",
            Self::PortKhazard => "PORT_KHAZARD",
            Self::ArdougneSouth => "ARDOUGNE_SOUTH",
            Self::ArdougneNorth => "ARDOUGNE_NORTH",
            Self::FishingGuild => "FISHING_GUILD",
            Self::Catherby => "CATHERBY",
            Self::RougesDen => "ROUGES_DEN",
            Self::SeersVillage => "SEERS_VILLAGE",
            Self::Etceteria => "ETCETERIA",
            Self::Jatizso => "JATIZSO",
            Self::Neitiznot => "NEITIZNOT",
            Self::LunarIsle => "LUNAR_ISLE",
            Self::PiscatorisFishingColony => "PISCATORIS_FISHING_COLONY",
            Self::TreeGnomeStronghold => "TREE_GNOME_STRONGHOLD",
            Self::GrandTree => "GRAND_TREE",
            Self::BarbarianOutpost => "BARBARIAN_OUTPOST",
            Self::CastleWars => "CASTLE_WARS",
            Self::Yanille => "YANILLE",
            Self::CorsairCove => "CORSAIR_COVE",
            Self::MythsGuild => "MYTHS_GUILD",
            Self::VoidKnightsOutpost => "VOID_KNIGHTS_OUTPOST",
            Self::SoulWarsLobby => "SOUL_WARS_LOBBY",
            Self::Lletya => "LLETYA",
            Self::InstancedLleytya => "INSTANCED_LLEYTYA",
            Self::PrifddinasSouthEast => "PRIFDDINAS_SOUTH_EAST",
            Self::PrifddinasNorthWest => "PRIFDDINAS_NORTH_WEST",
            Self::Zanaris => "ZANARIS",
            Self::MageArenaBank => "MAGE_ARENA_BANK",
            Self::Camdozaal => "CAMDOZAAL",
            Self::FightCaves => "FIGHT_CAVES",
            Self::MorUlRek => "MOR_UL_REK",
            Self::PortPiscarilius => "PORT_PISCARILIUS",
            Self::Arceuus => "ARCEUUS",
            Self::KourendCastle => "KOUREND_CASTLE",
            Self::Hosidius => "HOSIDIUS",
            Self::HosidiusVinery => "HOSIDIUS_VINERY",
            Self::HosidiusKitchen => "HOSIDIUS_KITCHEN",
            Self::WoodcuttingGuild => "WOODCUTTING_GUILD",
            Self::Shayzien => "SHAYZIEN",
            Self::LandsEnd => "LANDS_END",
            Self::Lovakengj => "LOVAKENGJ",
            Self::LovakengjMine => "LOVAKENGJ_MINE",
            Self::BlastMine => "BLAST_MINE",
            Self::Wintertodt => "WINTERTODT",
            Self::MountKaruulm => "MOUNT_KARUULM",
            Self::FarmingGuild => "FARMING_GUILD",
            Self::MountQuiidamortem => "MOUNT_QUIIDAMORTEM",
            Self::Auburnvale => "AUBURNVALE",
            Self::NemusRetreat => "NEMUS_RETREAT",
            Self::TalTeklan => "TAL_TEKLAN",
            Self::Aldarin => "ALDARIN",
            Self::Mistrock => "MISTROCK",
            Self::HunterGuild => "HUNTER_GUILD",
            Self::CivitasIllaFortisWest => "CIVITAS_ILLA_FORTIS_WEST",
            Self::CivitasIllaFortisEast => "CIVITAS_ILLA_FORTIS_EAST",
            Self::QuetzacalliGorge => "QUETZACALLI_GORGE",
            Self::TheDarkfrost => "THE_DARKFROST",
            Self::FeroxEnclave => "FEROX_ENCLAVE",
            Self::MotherlodeMine => "MOTHERLODE_MINE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse a persisted name.
    pub fn from_name(name: &str) -> Option<Self> {
        NAME_INDEX.get(name).copied()
    }

    /// Human-readable name: `VARROCK_WEST` becomes `Varrock west`.
    pub fn display_name(&self) -> String {
        let lower = self.as_str().to_lowercase().replace('_', " ");
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
