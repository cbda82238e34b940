//! Read-only tutorial catalogue, one entry per topic, in every supported language.

use serde::Serialize;

use crate::i18n::Language;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
  Sky,
  Green,
  Amber,
  Indigo,
  Rose,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutorial {
  pub key: &'static str,
  pub category: &'static str,
  pub color: Accent,
  pub title: &'static str,
  pub description: &'static str,
  pub detail: &'static str,
}

struct Entry {
  key: &'static str,
  category: &'static str,
  color: Accent,
  en: [&'static str; 3],
  pt: [&'static str; 3],
}

const ENTRIES: [Entry; 5] = [
  Entry {
    key: "prompting-mastery",
    category: "Core Skills",
    color: Accent::Sky,
    en: [
      "Prompting Mastery",
      "Learn the fundamentals of prompt design, including zero-shot, few-shot, and persona techniques to get better results from any LLM.",
      r#"Key Techniques:
- Zero-shot: Directly ask the model to perform a task without any prior examples. (e.g., "Translate 'hello' to French.")
- One-shot: Provide a single example to guide the model's response format. (e.g., "Translate English to French. sea otter -> loutre de mer. cheese -> ?")
- Few-shot: Offer several examples to demonstrate a complex pattern or style.
- Persona: Instruct the model to adopt a specific role. (e.g., "Act as a senior software engineer and review my code.")"#,
    ],
    pt: [
      "Mestria em Prompting",
      "Aprenda os fundamentos do design de prompts, incluindo técnicas de zero-shot, few-shot e persona para obter melhores resultados de qualquer LLM.",
      r#"Técnicas Principais:
- Zero-shot: Peça diretamente ao modelo para realizar uma tarefa sem exemplos prévios. (Ex: "Traduza 'hello' para francês.")
- One-shot: Forneça um único exemplo para guiar o formato da resposta do modelo. (Ex: "Traduza inglês para francês. sea otter -> loutre de mer. cheese -> ?")
- Few-shot: Ofereça vários exemplos para demonstrar um padrão ou estilo complexo.
- Persona: Instrua o modelo a adotar um papel específico. (Ex: "Aja como um engenheiro de software sênior e revise meu código.")"#,
    ],
  },
  Entry {
    key: "rag-explained",
    category: "Advanced Techniques",
    color: Accent::Green,
    en: [
      "Understanding RAG",
      "Dive into Retrieval-Augmented Generation to learn how to ground models with external data for more accurate and context-aware responses.",
      r#"RAG is a powerful technique that combines the vast knowledge of an LLM with specific, external information.
The process:
1.  **Retrieve:** When a query is made, the system first searches a knowledge base (like a set of company documents or a database) for relevant information.
2.  **Augment:** The retrieved information is added to the original prompt as context.
3.  **Generate:** The LLM uses this augmented prompt to generate a response that is grounded in the provided data, reducing hallucinations and improving accuracy."#,
    ],
    pt: [
      "Entendendo RAG",
      "Mergulhe na Geração Aumentada por Recuperação (RAG) para aprender a fundamentar modelos com dados externos para respostas mais precisas e contextuais.",
      r#"RAG é uma técnica poderosa que combina o vasto conhecimento de um LLM com informações externas específicas.
O processo:
1.  **Recuperar:** Quando uma consulta é feita, o sistema primeiro busca em uma base de conhecimento (como um conjunto de documentos da empresa ou um banco de dados) por informações relevantes.
2.  **Aumentar:** As informações recuperadas são adicionadas ao prompt original como contexto.
3.  **Gerar:** O LLM usa este prompt aumentado para gerar uma resposta que é baseada nos dados fornecidos, reduzindo alucinações e melhorando a precisão."#,
    ],
  },
  Entry {
    key: "vertex-ai-intro",
    category: "Google Cloud AI",
    color: Accent::Amber,
    en: [
      "Intro to Vertex AI",
      "Discover Google Cloud's unified AI platform. Learn how to build, deploy, and scale ML models with pre-trained APIs and custom tooling.",
      r#"Vertex AI is a managed machine learning (ML) platform that lets you accelerate the deployment and maintenance of AI models.
Key Features:
- **Model Garden:** A central place to discover, use, and customize a wide range of Google's foundation models and third-party models.
- **AutoML:** Train high-quality custom machine learning models with minimal effort and ML expertise.
- **Pipelines:** Create and manage serverless, reproducible ML workflows.
- **Agent Builder:** Build and deploy enterprise-grade generative AI agents."#,
    ],
    pt: [
      "Introdução ao Vertex AI",
      "Descubra a plataforma de IA unificada do Google Cloud. Aprenda a construir, implantar e escalar modelos de ML com APIs pré-treinadas e ferramentas personalizadas.",
      r#"Vertex AI é uma plataforma de machine learning (ML) gerenciada que permite acelerar a implantação e manutenção de modelos de IA.
Recursos Principais:
- **Model Garden:** Um local central para descobrir, usar e personalizar uma vasta gama de modelos de base do Google e de terceiros.
- **AutoML:** Treine modelos de machine learning personalizados de alta qualidade com esforço mínimo e pouca experiência em ML.
- **Pipelines:** Crie e gerencie fluxos de trabalho de ML reproduzíveis e sem servidor.
- **Agent Builder:** Construa e implante agentes de IA generativa de nível empresarial."#,
    ],
  },
  Entry {
    key: "building-agents",
    category: "AI Automation",
    color: Accent::Indigo,
    en: [
      "Building AI Agents",
      "Go beyond simple prompts. Learn the principles of creating autonomous agents that can reason, plan, and execute complex tasks.",
      r#"An AI agent is more than a chatbot. It's a system that can understand a goal, break it down into steps, and use tools to achieve it.
Core Components:
- **LLM as the "Brain":** The core language model that performs reasoning and planning.
- **Tools:** Functions or APIs the agent can call to interact with the outside world (e.g., search the web, access a database, send an email).
- **Memory:** The ability to retain information from past interactions to inform future actions.
- **Planning:** The process of decomposing a large task into smaller, manageable sub-tasks."#,
    ],
    pt: [
      "Construindo Agentes de IA",
      "Vá além de prompts simples. Aprenda os princípios da criação de agentes autônomos que podem raciocinar, planejar e executar tarefas complexas.",
      r#"Um agente de IA é mais que um chatbot. É um sistema que pode entender um objetivo, dividi-lo em etapas e usar ferramentas para alcançá-lo.
Componentes Essenciais:
- **LLM como o "Cérebro":** O modelo de linguagem central que realiza o raciocínio e o planejamento.
- **Ferramentas:** Funções ou APIs que o agente pode chamar para interagir com o mundo exterior (ex: pesquisar na web, acessar um banco de dados, enviar um e-mail).
- **Memória:** A capacidade de reter informações de interações passadas para informar ações futuras.
- **Planejamento:** O processo de decompor uma tarefa grande em subtarefas menores e gerenciáveis."#,
    ],
  },
  Entry {
    key: "chain-of-thought",
    category: "Advanced Techniques",
    color: Accent::Rose,
    en: [
      "Chain-of-Thought Prompting",
      r#"Encourage models to "think out loud" by structuring prompts that guide them through a step-by-step reasoning process for complex problems."#,
      r#"Chain-of-Thought (CoT) prompting improves results for tasks requiring reasoning, such as math problems or logic puzzles. By asking the model to explain its steps, you guide it toward a more accurate conclusion.

Example Prompt:
"Q: Roger has 5 tennis balls. He buys 2 more cans of tennis balls. Each can has 3 tennis balls. How many tennis balls does he have now?

A: Let's break this down step by step.
1. Roger started with 5 balls.
2. He bought 2 cans, and each can has 3 balls, so that's 2 * 3 = 6 new balls.
3. In total, he now has 5 + 6 = 11 balls.
The final answer is 11.""#,
    ],
    pt: [
      "Prompt de Cadeia de Pensamento",
      r#"Incentive os modelos a "pensar em voz alta", estruturando prompts que os guiam através de um processo de raciocínio passo a passo para problemas complexos."#,
      r#"O prompt de Cadeia de Pensamento (CoT) melhora os resultados para tarefas que exigem raciocínio, como problemas de matemática ou quebra-cabeças lógicos. Ao pedir ao modelo para explicar seus passos, você o guia para uma conclusão mais precisa.

Exemplo de Prompt:
"P: Roger tem 5 bolas de tênis. Ele compra mais 2 latas de bolas de tênis. Cada lata tem 3 bolas de tênis. Quantas bolas de tênis ele tem agora?

R: Vamos analisar passo a passo.
1. Roger começou com 5 bolas.
2. Ele comprou 2 latas, e cada lata tem 3 bolas, então são 2 * 3 = 6 bolas novas.
3. No total, ele agora tem 5 + 6 = 11 bolas.
A resposta final é 11.""#,
    ],
  },
];

/// The catalogue in display order.
pub fn catalogue(lang: Language) -> Vec<Tutorial> {
  ENTRIES
    .iter()
    .map(|e| {
      let [title, description, detail] = match lang {
        Language::En => e.en,
        Language::Pt => e.pt,
      };
      Tutorial { key: e.key, category: e.category, color: e.color, title, description, detail }
    })
    .collect()
}
