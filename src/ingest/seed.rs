//! 固定编辑分类表

use tracing::debug;

use crate::errors::Result;
use crate::services::EditorialService;

pub const EDITORIAL_CATEGORIES: &[&str] = &[
    // Notícias gerais
    "Notícias Gerais", "Brasil", "Política", "Economia", "Educação", "Saúde", "Ciência",
    "Internacional", "Mundo", "Cidades", "Segurança Pública",
    // Esportes
    "Esportes", "Futebol", "Brasileirão", "Copa do Brasil", "Libertadores", "Champions League",
    "UFC", "NBA", "Vôlei", "Fórmula 1", "Esportes Radicais",
    // Entretenimento
    "Entretenimento", "TV", "Famosos", "Cinema", "Música", "Reality Shows", "BBB", "A Fazenda",
    "Séries e Streaming",
    // Tecnologia
    "Tecnologia", "Inovação", "Inteligência Artificial", "Gadgets", "Segurança Digital",
    "Internet", "Games",
    // Economia / mercado
    "Finanças Pessoais", "Investimentos", "Empreendedorismo", "Agronegócio", "Carreiras",
    "Concursos",
    // Automóveis
    "Automóveis", "Lançamentos", "Testes", "Dicas", "Mercado Automotivo",
    // Meio ambiente
    "Meio Ambiente", "Clima", "Sustentabilidade", "Energia",
    "Culinária", "Global", "Nacional",
    // Temas
    "Violência", "Previsão do Tempo", "Desastres Naturais", "Eleições", "Fake News",
    "Cibersegurança", "Vacinação", "Inflação", "Impostos", "Redes Sociais", "Criptomoedas",
    "Metaverso",
    // Pessoas
    "Lula", "Bolsonaro", "Neymar", "Anitta", "Elon Musk", "Messi", "Celebridades",
    // Locais
    "Recife", "São Paulo", "Rio de Janeiro", "Brasília", "Pernambuco", "Nordeste", "EUA",
    "Europa",
    // Organizações
    "STF", "Congresso", "MEC", "OMS", "Petrobras", "IBGE", "Apple", "Google", "Meta", "Microsoft",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub existing: usize,
}

/// get-or-create 每个分类；重复执行不产生新行
pub async fn seed_categories(editorial: &EditorialService) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    for name in EDITORIAL_CATEGORIES {
        let (category, created) = editorial.get_or_create_category(name).await?;
        if created {
            debug!("Category created: {}", category.name);
            report.created += 1;
        } else {
            report.existing += 1;
        }
    }
    Ok(report)
}
