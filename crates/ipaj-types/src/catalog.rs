use crate::models::{Material, MaterialKind};

pub const ALL_CATEGORIES: &str = "Todos";

pub const CATEGORIES: [&str; 5] = [
    ALL_CATEGORIES,
    "Direito do Trabalho",
    "Direito da Família",
    "Contratos",
    "Heranças",
];

pub static MATERIALS: &[Material] = &[
    Material {
        id: 2,
        kind: MaterialKind::Video,
        category: "Direito da Família",
        title: "Divórcio e Guarda de Filhos",
        url: "https://youtu.be/E3qrfQpTAtU?si=3Fo-wT6mSmwEUDF6",
        thumb: "/materiais/familia-video.jpg",
    },
    Material {
        id: 5,
        kind: MaterialKind::Video,
        category: "Contratos",
        title: "Como Redigir um Contrato Legal",
        url: "https://youtu.be/HZoqakcXml4?si=r4pvSev9QWmtEcMb",
        thumb: "/materiais/contrato-video.jpg",
    },
    Material {
        id: 8,
        kind: MaterialKind::Video,
        category: "Heranças",
        title: "Quem Tem Direito à Herança?",
        url: "https://youtu.be/issJRCmoKUs?si=kUakd4kj3yRF0WR1",
        thumb: "/materiais/heranca-video.jpg",
    },
    Material {
        id: 1,
        kind: MaterialKind::Pdf,
        category: "Direito do Trabalho",
        title: "Guia Prático - Direitos do Trabalhador",
        url: "https://www.dhconsultores.net/images/faq/Lei_do_Trabalho_versao_14_03_2023VF-2.pdf",
        thumb: "/materiais/direitodetrabalho.jpg",
    },
    Material {
        id: 4,
        kind: MaterialKind::Pdf,
        category: "Heranças",
        title: "Como Funciona a Partilha de Bens",
        url: "https://ts.gov.mz/wp-content/uploads/2024/01/Processo-35.pdf",
        thumb: "/materiais/partilhadebens.jpg",
    },
    Material {
        id: 6,
        kind: MaterialKind::Pdf,
        category: "Direito do Trabalho",
        title: "Código do Trabalho Moçambicano",
        url: "https://gpa.co.mz/lei-do-trabalho/",
        thumb: "/materiais/job.jpg",
    },
    Material {
        id: 9,
        kind: MaterialKind::Pdf,
        category: "Contratos",
        title: "Modelos de Contratos Comerciais",
        url: "https://www.direitonet.com.br/contratos/exemplos",
        thumb: "/materiais/exemplosdecontratos.jpg",
    },
    Material {
        id: 10,
        kind: MaterialKind::Pdf,
        category: "Direito da Família",
        title: "Direitos e Deveres no Casamento",
        url: "https://www.docsity.com/en/docs/mozambiacan-family-law/9026827/",
        thumb: "/materiais/casamento.jpg",
    },
];

/// Materials in `category` (or all, for `None`/"Todos") whose title contains
/// `search`, case-insensitively.
pub fn filter(category: Option<&str>, search: Option<&str>) -> Vec<&'static Material> {
    let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    MATERIALS
        .iter()
        .filter(|m| match category {
            None | Some(ALL_CATEGORIES) | Some("") => true,
            Some(c) => m.category == c,
        })
        .filter(|m| needle.is_empty() || m.title.to_lowercase().contains(&needle))
        .collect()
}

/// Embeddable player URL for YouTube links; other URLs are returned as-is.
pub fn embed_url(url: &str) -> String {
    const MARKERS: [&str; 3] = ["youtu.be/", "youtube.com/watch?v=", "youtube.com/embed/"];

    for marker in MARKERS {
        if let Some(pos) = url.find(marker) {
            let id: String = url[pos + marker.len()..]
                .chars()
                .take_while(|c| !matches!(c, '&' | '?' | '/' | '#') && !c.is_whitespace())
                .collect();
            if !id.is_empty() {
                return format!("https://www.youtube.com/embed/{}", id);
            }
        }
    }

    url.to_string()
}
