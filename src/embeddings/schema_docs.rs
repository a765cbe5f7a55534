// Descriptions of the Protheus tables exposed to the SQL agent

/// (table, description) for every table the service knows how to describe.
pub const PROTHEUS_TABLES: &[(&str, &str)] = &[
    ("SE1010", "Cadastro de transportadoras com dados como nome, CNPJ, endereço e código de identificação."),
    ("SB1010", "Cadastro de produtos com informações como descrição, unidade, preço e código de barras."),
    ("SA1010", "Cadastro de clientes com dados como nome, endereço, CPF/CNPJ, e cidade."),
    ("SD1010", "Cadastro de fornecedores com dados fiscais e de contato."),
    ("SF1010", "Cabeçalho das notas fiscais, contendo data, número da nota, cliente e valores totais."),
    ("SF2010", "Itens das notas fiscais, com produto, quantidade, valor unitário e total."),
    ("SE2010", "Conhecimentos de transporte, com dados sobre o frete, transportadora e destinatário."),
];

/// Maximum characters per indexed chunk of the catalog.
pub const SCHEMA_CHUNK_SIZE: usize = 1000;

/// One line per included table, in catalog order. Table names compare
/// case-insensitively; unknown names are ignored.
pub fn schema_snippets(include_tables: &[String]) -> Vec<String> {
    PROTHEUS_TABLES
        .iter()
        .filter(|(table, _)| include_tables.iter().any(|t| t.eq_ignore_ascii_case(table)))
        .map(|(table, description)| format!("Tabela {}: {}", table, description))
        .collect()
}

/// The whole catalog as a single text, one table per line.
pub fn schema_document(include_tables: &[String]) -> String {
    schema_snippets(include_tables).join("\n")
}

/// Split `text` on line boundaries, packing consecutive lines into chunks of
/// at most `chunk_size` characters. A single line longer than `chunk_size`
/// becomes its own chunk.
pub fn split_document(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let line_len = line.chars().count();
        if !current.is_empty() && current_len + 1 + line_len > chunk_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Chunks fed to the schema index. The default catalog fits in one chunk, so
/// a top-1 search hands the agent every table.
pub fn schema_chunks(include_tables: &[String]) -> Vec<String> {
    split_document(&schema_document(include_tables), SCHEMA_CHUNK_SIZE)
}
